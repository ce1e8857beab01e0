//! Order-book flow: full-depth recompute heatmap.
//!
//! [`BookFlow`] maintains the venue's resting depth ([`BookDepth`]) from
//! incremental deltas and, on every accepted update, re-buckets the entire
//! surviving book into price levels and overwrites the current second's row.
//! Each row of the minute matrix therefore holds the latest resting shape of
//! the book observed during that second, and the freeze-time gap fill
//! repeats it through seconds without updates.

use std::collections::BTreeMap;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use tracing::debug;
use uuid::Uuid;

use super::error::FlowError;
use super::level::{Level, percent_distance};
use super::matrix::{FillPolicy, MinuteMatrix, ResetPolicy, SecondCursor};
use super::snapshot::{BookSnapshot, SnapshotEvent, SnapshotListener, SnapshotPayload};
use super::tick::{BookUpdate, Side, ensure_non_negative, ensure_positive, slot_for};
use crate::utils::current_time_millis;

/// Default ceiling, in percent distance from the mid price, beyond which
/// resting book entries are ignored and pruned.
pub const DEFAULT_BOOK_CEILING_PCT: f64 = 5.0;

/// Mutable resting-depth state for one venue book: price → amount per side.
#[derive(Debug, Clone, Default)]
pub struct BookDepth {
    bids: BTreeMap<OrderedFloat<f64>, f64>,
    asks: BTreeMap<OrderedFloat<f64>, f64>,
}

impl BookDepth {
    /// An empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one delta: an amount of zero deletes the entry at that price,
    /// anything else upserts it.
    pub fn apply(&mut self, side: Side, price: f64, amount: f64) {
        let book = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if amount == 0.0 {
            book.remove(&OrderedFloat(price));
        } else {
            book.insert(OrderedFloat(price), amount);
        }
    }

    /// Highest resting bid price.
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.keys().next_back().map(|p| p.0)
    }

    /// Lowest resting ask price.
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.keys().next().map(|p| p.0)
    }

    /// Average of best bid and best ask, absent while either side is empty.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            _ => None,
        }
    }

    /// Remove entries farther than `ceiling_pct` percent from `mid`.
    pub fn prune_beyond(&mut self, mid: f64, ceiling_pct: f64) {
        self.bids
            .retain(|price, _| percent_distance(price.0, mid).abs() <= ceiling_pct);
        self.asks
            .retain(|price, _| percent_distance(price.0, mid).abs() <= ceiling_pct);
    }

    /// Sum both sides of the book into per-level buckets.
    pub fn bucket(&self, level_size: f64) -> BTreeMap<Level, f64> {
        let mut sums = BTreeMap::new();
        for (price, amount) in self.bids.iter().chain(self.asks.iter()) {
            *sums.entry(Level::bucket(price.0, level_size)).or_insert(0.0) += *amount;
        }
        sums
    }

    /// Number of resting entries across both sides.
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    /// True when both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Rolling-minute heatmap flow over order-book updates for one venue.
pub struct BookFlow {
    venue: String,
    symbol: String,
    level_size: f64,
    book_ceiling_pct: f64,
    depth: BookDepth,
    matrix: MinuteMatrix,
    cursor: SecondCursor,
    snapshot: Option<Arc<BookSnapshot>>,
    snapshot_listener: Option<SnapshotListener>,
}

impl BookFlow {
    /// A new flow with the default book ceiling.
    pub fn new(venue: &str, symbol: &str, level_size: f64) -> Self {
        Self {
            venue: venue.to_string(),
            symbol: symbol.to_string(),
            level_size,
            book_ceiling_pct: DEFAULT_BOOK_CEILING_PCT,
            depth: BookDepth::new(),
            matrix: MinuteMatrix::new(level_size),
            cursor: SecondCursor::new(),
            snapshot: None,
            snapshot_listener: None,
        }
    }

    /// Override the percent ceiling beyond which book entries are dropped.
    pub fn with_book_ceiling(mut self, ceiling_pct: f64) -> Self {
        self.book_ceiling_pct = ceiling_pct;
        self
    }

    /// Attach a listener notified whenever a snapshot is published.
    pub fn with_snapshot_listener(mut self, listener: SnapshotListener) -> Self {
        self.snapshot_listener = Some(listener);
        self
    }

    /// Process one normalized book update.
    ///
    /// Validates the update, rolls the minute over when the clock wrapped,
    /// applies the deltas to the resting depth, prunes entries beyond the
    /// ceiling, records the mid price, and overwrites the current second's
    /// row with the re-bucketed depth.
    pub fn update(&mut self, update: &BookUpdate) -> Result<(), FlowError> {
        let slot = slot_for(update.timestamp)?;
        for (price, amount) in update.bids.iter().chain(update.asks.iter()) {
            ensure_positive("price", *price)?;
            ensure_non_negative("amount", *amount)?;
        }

        if self.cursor.advance(slot) {
            self.publish();
            self.matrix.reset(ResetPolicy::Drop);
            if let Some(mid) = self.depth.mid_price() {
                self.depth.prune_beyond(mid, self.book_ceiling_pct);
            }
        }

        for (price, amount) in &update.bids {
            self.depth.apply(Side::Buy, *price, *amount);
        }
        for (price, amount) in &update.asks {
            self.depth.apply(Side::Sell, *price, *amount);
        }

        if let Some(mid) = self.depth.mid_price() {
            self.depth.prune_beyond(mid, self.book_ceiling_pct);
            self.matrix.record_price(slot, mid);
        }

        let sums = self.depth.bucket(self.level_size);
        self.matrix.overwrite_row(slot, &sums);
        Ok(())
    }

    fn publish(&mut self) {
        let snapshot = Arc::new(BookSnapshot {
            snapshot_id: Uuid::new_v4(),
            venue: self.venue.clone(),
            symbol: self.symbol.clone(),
            taken_at: current_time_millis(),
            grid: self.matrix.freeze(FillPolicy::All),
        });
        debug!(venue = %self.venue, symbol = %self.symbol, "book flow rolled over");
        self.snapshot = Some(Arc::clone(&snapshot));

        if let Some(listener) = &self.snapshot_listener {
            listener(&SnapshotEvent {
                venue: self.venue.clone(),
                symbol: self.symbol.clone(),
                payload: SnapshotPayload::Books(snapshot),
                published_at: current_time_millis(),
            });
        }
    }

    /// Latest frozen snapshot, absent until the first rollover.
    pub fn snapshot(&self) -> Option<Arc<BookSnapshot>> {
        self.snapshot.clone()
    }

    /// The maintained resting depth.
    pub fn depth(&self) -> &BookDepth {
        &self.depth
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
