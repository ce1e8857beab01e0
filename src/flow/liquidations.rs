//! Liquidation flow: per-position-side accumulation heatmap.
//!
//! Structurally the trade flow with long/short naming: buy-side events
//! accumulate into the `longs` matrix, sell-side events into `shorts`. The
//! reference price is last-write within a second.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::error::FlowError;
use super::level::Level;
use super::matrix::{FillPolicy, MinuteMatrix, ResetPolicy, SecondCursor, WriteMode};
use super::snapshot::{LiquidationSnapshot, SnapshotEvent, SnapshotListener, SnapshotPayload};
use super::tick::{LiquidationTick, Side, ensure_positive, slot_for};
use crate::utils::current_time_millis;

/// Rolling-minute heatmap flow over forced liquidations for one venue.
pub struct LiquidationFlow {
    venue: String,
    symbol: String,
    level_size: f64,
    longs: MinuteMatrix,
    shorts: MinuteMatrix,
    cursor: SecondCursor,
    snapshot: Option<Arc<LiquidationSnapshot>>,
    snapshot_listener: Option<SnapshotListener>,
}

impl LiquidationFlow {
    /// A new flow with empty long and short matrices.
    pub fn new(venue: &str, symbol: &str, level_size: f64) -> Self {
        Self {
            venue: venue.to_string(),
            symbol: symbol.to_string(),
            level_size,
            longs: MinuteMatrix::new(level_size),
            shorts: MinuteMatrix::new(level_size),
            cursor: SecondCursor::new(),
            snapshot: None,
            snapshot_listener: None,
        }
    }

    /// Attach a listener notified whenever a snapshot is published.
    pub fn with_snapshot_listener(mut self, listener: SnapshotListener) -> Self {
        self.snapshot_listener = Some(listener);
        self
    }

    /// Process one normalized liquidation.
    pub fn update(&mut self, tick: &LiquidationTick) -> Result<(), FlowError> {
        let slot = slot_for(tick.timestamp)?;
        ensure_positive("price", tick.price)?;
        ensure_positive("amount", tick.amount)?;

        if self.cursor.advance(slot) {
            self.publish();
            self.longs.reset(ResetPolicy::Drop);
            self.shorts.reset(ResetPolicy::Drop);
        }

        let matrix = match tick.side {
            Side::Buy => &mut self.longs,
            Side::Sell => &mut self.shorts,
        };
        matrix.record_price(slot, tick.price);
        matrix.observe(
            slot,
            Level::bucket(tick.price, self.level_size),
            tick.amount,
            WriteMode::Accumulate,
        );
        Ok(())
    }

    fn publish(&mut self) {
        let snapshot = Arc::new(LiquidationSnapshot {
            snapshot_id: Uuid::new_v4(),
            venue: self.venue.clone(),
            symbol: self.symbol.clone(),
            taken_at: current_time_millis(),
            longs: self.longs.freeze(FillPolicy::PriceOnly),
            shorts: self.shorts.freeze(FillPolicy::PriceOnly),
        });
        debug!(venue = %self.venue, symbol = %self.symbol, "liquidation flow rolled over");
        self.snapshot = Some(Arc::clone(&snapshot));

        if let Some(listener) = &self.snapshot_listener {
            listener(&SnapshotEvent {
                venue: self.venue.clone(),
                symbol: self.symbol.clone(),
                payload: SnapshotPayload::Liquidations(snapshot),
                published_at: current_time_millis(),
            });
        }
    }

    /// Latest frozen snapshot, absent until the first rollover.
    pub fn snapshot(&self) -> Option<Arc<LiquidationSnapshot>> {
        self.snapshot.clone()
    }

    /// The in-progress liquidated-longs matrix.
    pub fn longs(&self) -> &MinuteMatrix {
        &self.longs
    }

    /// The in-progress liquidated-shorts matrix.
    pub fn shorts(&self) -> &MinuteMatrix {
        &self.shorts
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
