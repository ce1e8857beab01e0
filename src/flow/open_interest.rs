//! Open-interest flow: delta-of-cumulative heatmap.
//!
//! Venues report open interest as an absolute level. [`OpenInterestFlow`]
//! differences consecutive readings and overwrites the delta into the slot
//! of the tick's own price level. `previous_oi` is seeded from the first
//! reading (a zero delta) and survives minute rollovers, so the deltas stay
//! meaningful across minutes; the level set is likewise retained forever.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::error::FlowError;
use super::level::Level;
use super::matrix::{FillPolicy, MinuteMatrix, ResetPolicy, SecondCursor, WriteMode};
use super::snapshot::{OpenInterestSnapshot, SnapshotEvent, SnapshotListener, SnapshotPayload};
use super::tick::{OpenInterestTick, ensure_positive, slot_for};
use crate::utils::current_time_millis;

/// Rolling-minute heatmap flow over open-interest readings for one venue.
pub struct OpenInterestFlow {
    venue: String,
    symbol: String,
    level_size: f64,
    matrix: MinuteMatrix,
    cursor: SecondCursor,
    previous_oi: Option<f64>,
    snapshot: Option<Arc<OpenInterestSnapshot>>,
    snapshot_listener: Option<SnapshotListener>,
}

impl OpenInterestFlow {
    /// A new flow that has not yet seen a reading.
    pub fn new(venue: &str, symbol: &str, level_size: f64) -> Self {
        Self {
            venue: venue.to_string(),
            symbol: symbol.to_string(),
            level_size,
            matrix: MinuteMatrix::new(level_size),
            cursor: SecondCursor::new(),
            previous_oi: None,
            snapshot: None,
            snapshot_listener: None,
        }
    }

    /// Attach a listener notified whenever a snapshot is published.
    pub fn with_snapshot_listener(mut self, listener: SnapshotListener) -> Self {
        self.snapshot_listener = Some(listener);
        self
    }

    /// Process one normalized open-interest reading.
    pub fn update(&mut self, tick: &OpenInterestTick) -> Result<(), FlowError> {
        let slot = slot_for(tick.timestamp)?;
        ensure_positive("price", tick.price)?;
        ensure_positive("open_interest", tick.open_interest)?;

        let delta = match self.previous_oi {
            Some(previous) => tick.open_interest - previous,
            None => 0.0,
        };

        if self.cursor.advance(slot) {
            self.publish();
            self.matrix.reset(ResetPolicy::RetainLevels);
        }

        self.matrix.record_price(slot, tick.price);
        self.matrix.observe(
            slot,
            Level::bucket(tick.price, self.level_size),
            delta,
            WriteMode::Overwrite,
        );
        self.previous_oi = Some(tick.open_interest);
        Ok(())
    }

    fn publish(&mut self) {
        let snapshot = Arc::new(OpenInterestSnapshot {
            snapshot_id: Uuid::new_v4(),
            venue: self.venue.clone(),
            symbol: self.symbol.clone(),
            taken_at: current_time_millis(),
            grid: self.matrix.freeze(FillPolicy::PriceOnly),
        });
        debug!(venue = %self.venue, symbol = %self.symbol, "open-interest flow rolled over");
        self.snapshot = Some(Arc::clone(&snapshot));

        if let Some(listener) = &self.snapshot_listener {
            listener(&SnapshotEvent {
                venue: self.venue.clone(),
                symbol: self.symbol.clone(),
                payload: SnapshotPayload::OpenInterest(snapshot),
                published_at: current_time_millis(),
            });
        }
    }

    /// Latest frozen snapshot, absent until the first rollover.
    pub fn snapshot(&self) -> Option<Arc<OpenInterestSnapshot>> {
        self.snapshot.clone()
    }

    /// The last absolute OI reading, absent before the first tick.
    pub fn previous_oi(&self) -> Option<f64> {
        self.previous_oi
    }

    /// The in-progress delta matrix.
    pub fn matrix(&self) -> &MinuteMatrix {
        &self.matrix
    }

    /// Venue this flow consumes.
    pub fn venue(&self) -> &str {
        &self.venue
    }

    /// Instrument symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Bucket width used for level aggregation.
    pub fn level_size(&self) -> f64 {
        self.level_size
    }
}
