//! Trade flow: per-side accumulation heatmap.
//!
//! [`TradeFlow`] accumulates executed volume into two independent minute
//! matrices, one per aggressor side. Each accepted trade records its price
//! into the active side's price column and adds its amount to the bucketed
//! level for that side only.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::error::FlowError;
use super::level::Level;
use super::matrix::{FillPolicy, MinuteMatrix, ResetPolicy, SecondCursor, WriteMode};
use super::snapshot::{SnapshotEvent, SnapshotListener, SnapshotPayload, TradeSnapshot};
use super::tick::{Side, TradeTick, ensure_positive, slot_for};
use crate::utils::current_time_millis;

/// Rolling-minute heatmap flow over executed trades for one venue.
pub struct TradeFlow {
    venue: String,
    symbol: String,
    level_size: f64,
    buys: MinuteMatrix,
    sells: MinuteMatrix,
    cursor: SecondCursor,
    snapshot: Option<Arc<TradeSnapshot>>,
    snapshot_listener: Option<SnapshotListener>,
}

impl TradeFlow {
    /// A new flow with empty buy and sell matrices.
    pub fn new(venue: &str, symbol: &str, level_size: f64) -> Self {
        Self {
            venue: venue.to_string(),
            symbol: symbol.to_string(),
            level_size,
            buys: MinuteMatrix::new(level_size),
            sells: MinuteMatrix::new(level_size),
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

    /// Process one normalized trade.
    pub fn update(&mut self, tick: &TradeTick) -> Result<(), FlowError> {
        let slot = slot_for(tick.timestamp)?;
        ensure_positive("price", tick.price)?;
        ensure_positive("amount", tick.amount)?;

        if self.cursor.advance(slot) {
            self.publish();
            self.buys.reset(ResetPolicy::Drop);
            self.sells.reset(ResetPolicy::Drop);
        }

        let matrix = match tick.side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
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
        let snapshot = Arc::new(TradeSnapshot {
            snapshot_id: Uuid::new_v4(),
            venue: self.venue.clone(),
            symbol: self.symbol.clone(),
            taken_at: current_time_millis(),
            buys: self.buys.freeze(FillPolicy::PriceOnly),
            sells: self.sells.freeze(FillPolicy::PriceOnly),
        });
        debug!(venue = %self.venue, symbol = %self.symbol, "trade flow rolled over");
        self.snapshot = Some(Arc::clone(&snapshot));

        if let Some(listener) = &self.snapshot_listener {
            listener(&SnapshotEvent {
                venue: self.venue.clone(),
                symbol: self.symbol.clone(),
                payload: SnapshotPayload::Trades(snapshot),
                published_at: current_time_millis(),
            });
        }
    }

    /// Latest frozen snapshot, absent until the first rollover.
    pub fn snapshot(&self) -> Option<Arc<TradeSnapshot>> {
        self.snapshot.clone()
    }

    /// The in-progress buy-side matrix.
    pub fn buys(&self) -> &MinuteMatrix {
        &self.buys
    }

    /// The in-progress sell-side matrix.
    pub fn sells(&self) -> &MinuteMatrix {
        &self.sells
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
