//! Cross-venue snapshot merging.
//!
//! [`SnapshotBoard`] is the concurrent registry flows publish into: one slot
//! per `(venue, kind)`, each holding an `Arc` to the latest frozen snapshot,
//! so publication is a single atomic handoff. [`MergeEngine`] reads the
//! board's snapshots for one instrument, aligns them on the union of price
//! levels (missing levels count as zero), sums element-wise, and derives the
//! kind-specific statistics.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::trace;

use serde::{Deserialize, Serialize};

use super::matrix::HeatmapGrid;
use super::snapshot::{
    BookSnapshot, LiquidationSnapshot, OpenInterestSnapshot, SnapshotEvent, SnapshotPayload,
    TradeSnapshot,
};
use super::statistics::{
    BookStats, LiquidationStats, OpenInterestStats, StatFlags, TradeStats, book_stats, dominance,
    liquidation_stats, open_interest_stats, trade_stats,
};
use super::tick::FlowKind;
use crate::utils::current_time_millis;

/// Errors from cross-venue merging.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum MergeError {
    /// No venue has published a snapshot of this kind yet.
    #[error("no {kind} snapshots available to merge")]
    NoSnapshots {
        /// The requested flow kind.
        kind: FlowKind,
    },

    /// A snapshot belongs to a different instrument.
    #[error("snapshot symbol mismatch: expected {expected}, got {actual}")]
    SymbolMismatch {
        /// The engine's instrument.
        expected: String,
        /// The offending snapshot's instrument.
        actual: String,
    },

    /// Snapshots were aggregated with different bucket widths.
    #[error("snapshot level size mismatch: expected {expected}, got {actual}")]
    LevelSizeMismatch {
        /// The first snapshot's bucket width.
        expected: f64,
        /// The offending snapshot's bucket width.
        actual: f64,
    },
}

/// Concurrent registry of the latest published snapshot per (venue, kind).
///
/// Snapshots are immutable and shared by `Arc`; replacing a slot is the
/// atomic handoff that lets merge run on a different thread from the flows.
#[derive(Debug, Default)]
pub struct SnapshotBoard {
    slots: DashMap<(String, FlowKind), SnapshotPayload>,
}

impl SnapshotBoard {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a snapshot, replacing any previous one for that venue/kind.
    pub fn publish(&self, event: &SnapshotEvent) {
        self.slots.insert(
            (event.venue.clone(), event.payload.kind()),
            event.payload.clone(),
        );
    }

    /// Latest book snapshots across venues, ordered by venue name so merge
    /// results are deterministic.
    pub fn books(&self) -> Vec<Arc<BookSnapshot>> {
        let mut snapshots: Vec<Arc<BookSnapshot>> = self
            .slots
            .iter()
            .filter_map(|entry| match entry.value() {
                SnapshotPayload::Books(s) => Some(Arc::clone(s)),
                _ => None,
            })
            .collect();
        snapshots.sort_by(|a, b| a.venue.cmp(&b.venue));
        snapshots
    }

    /// Latest trade snapshots across venues, ordered by venue name.
    pub fn trades(&self) -> Vec<Arc<TradeSnapshot>> {
        let mut snapshots: Vec<Arc<TradeSnapshot>> = self
            .slots
            .iter()
            .filter_map(|entry| match entry.value() {
                SnapshotPayload::Trades(s) => Some(Arc::clone(s)),
                _ => None,
            })
            .collect();
        snapshots.sort_by(|a, b| a.venue.cmp(&b.venue));
        snapshots
    }

    /// Latest open-interest snapshots across venues, ordered by venue name.
    pub fn open_interest(&self) -> Vec<Arc<OpenInterestSnapshot>> {
        let mut snapshots: Vec<Arc<OpenInterestSnapshot>> = self
            .slots
            .iter()
            .filter_map(|entry| match entry.value() {
                SnapshotPayload::OpenInterest(s) => Some(Arc::clone(s)),
                _ => None,
            })
            .collect();
        snapshots.sort_by(|a, b| a.venue.cmp(&b.venue));
        snapshots
    }

    /// Latest liquidation snapshots across venues, ordered by venue name.
    pub fn liquidations(&self) -> Vec<Arc<LiquidationSnapshot>> {
        let mut snapshots: Vec<Arc<LiquidationSnapshot>> = self
            .slots
            .iter()
            .filter_map(|entry| match entry.value() {
                SnapshotPayload::Liquidations(s) => Some(Arc::clone(s)),
                _ => None,
            })
            .collect();
        snapshots.sort_by(|a, b| a.venue.cmp(&b.venue));
        snapshots
    }

    /// Venues that have published at least one snapshot.
    pub fn venues(&self) -> Vec<String> {
        let mut venues: Vec<String> = self
            .slots
            .iter()
            .map(|entry| entry.key().0.clone())
            .collect();
        venues.sort();
        venues.dedup();
        venues
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Cross-venue merged book heatmap with derived statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedBooks {
    /// Instrument symbol.
    pub symbol: String,
    /// Milliseconds since epoch when the merge ran.
    pub merged_at: u64,
    /// Venues that contributed.
    pub venues: Vec<String>,
    /// Element-wise sum of resting volume across venues.
    pub grid: HeatmapGrid,
    /// Derived statistics.
    pub stats: BookStats,
}

/// Cross-venue merged trade heatmaps with dominance and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedTrades {
    /// Instrument symbol.
    pub symbol: String,
    /// Milliseconds since epoch when the merge ran.
    pub merged_at: u64,
    /// Venues that contributed.
    pub venues: Vec<String>,
    /// Buy-side volume summed across venues.
    pub buys: HeatmapGrid,
    /// Sell-side volume summed across venues.
    pub sells: HeatmapGrid,
    /// Both sides combined.
    pub combined: HeatmapGrid,
    /// `max(buys − sells, 0)` per cell.
    pub buy_dominance: HeatmapGrid,
    /// `min(sells − buys, 0)` per cell.
    pub sell_dominance: HeatmapGrid,
    /// Derived statistics.
    pub stats: TradeStats,
}

/// Cross-venue merged open-interest delta heatmap with statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedOpenInterest {
    /// Instrument symbol.
    pub symbol: String,
    /// Milliseconds since epoch when the merge ran.
    pub merged_at: u64,
    /// Venues that contributed.
    pub venues: Vec<String>,
    /// OI deltas summed across venues.
    pub grid: HeatmapGrid,
    /// Derived statistics.
    pub stats: OpenInterestStats,
}

/// Cross-venue merged liquidation heatmaps with statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedLiquidations {
    /// Instrument symbol.
    pub symbol: String,
    /// Milliseconds since epoch when the merge ran.
    pub merged_at: u64,
    /// Venues that contributed.
    pub venues: Vec<String>,
    /// Liquidated longs summed across venues.
    pub longs: HeatmapGrid,
    /// Liquidated shorts summed across venues.
    pub shorts: HeatmapGrid,
    /// Both sides combined.
    pub combined: HeatmapGrid,
    /// Derived statistics.
    pub stats: LiquidationStats,
}

/// Merges same-instrument snapshots across venues and derives statistics.
///
/// The engine keeps no state beyond the last merged output per kind; merge
/// inputs come from whatever the venues have published, so a slow venue
/// simply contributes nothing until it catches up.
#[derive(Debug)]
pub struct MergeEngine {
    symbol: String,
    flags: StatFlags,
    last_books: Option<Arc<MergedBooks>>,
    last_trades: Option<Arc<MergedTrades>>,
    last_open_interest: Option<Arc<MergedOpenInterest>>,
    last_liquidations: Option<Arc<MergedLiquidations>>,
}

impl MergeEngine {
    /// An engine for one instrument, deriving all statistics.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            flags: StatFlags::ALL,
            last_books: None,
            last_trades: None,
            last_open_interest: None,
            last_liquidations: None,
        }
    }

    /// Restrict which statistics are derived.
    pub fn with_flags(mut self, flags: StatFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Instrument this engine merges.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Merge the given book snapshots (one per venue).
    pub fn merge_books(
        &mut self,
        snapshots: &[Arc<BookSnapshot>],
    ) -> Result<Arc<MergedBooks>, MergeError> {
        if snapshots.is_empty() {
            return Err(MergeError::NoSnapshots {
                kind: FlowKind::Books,
            });
        }
        for snapshot in snapshots {
            self.check_symbol(&snapshot.symbol)?;
        }

        let grid = merge_grids(snapshots.iter().map(|s| &s.grid))?;
        let merged = Arc::new(MergedBooks {
            symbol: self.symbol.clone(),
            merged_at: current_time_millis(),
            venues: snapshots.iter().map(|s| s.venue.clone()).collect(),
            stats: book_stats(&grid, self.flags),
            grid,
        });
        trace!(symbol = %self.symbol, venues = merged.venues.len(), "merged book snapshots");
        self.last_books = Some(Arc::clone(&merged));
        Ok(merged)
    }

    /// Merge the given trade snapshots (one per venue).
    pub fn merge_trades(
        &mut self,
        snapshots: &[Arc<TradeSnapshot>],
    ) -> Result<Arc<MergedTrades>, MergeError> {
        if snapshots.is_empty() {
            return Err(MergeError::NoSnapshots {
                kind: FlowKind::Trades,
            });
        }
        for snapshot in snapshots {
            self.check_symbol(&snapshot.symbol)?;
        }

        let buys = merge_grids(snapshots.iter().map(|s| &s.buys))?;
        let sells = merge_grids(snapshots.iter().map(|s| &s.sells))?;
        let combined = buys.combined_with(&sells);
        let (buy_dominance, sell_dominance) = if self.flags.contains(StatFlags::DOMINANCE) {
            dominance(&buys, &sells)
        } else {
            (
                HeatmapGrid::empty(buys.level_size),
                HeatmapGrid::empty(buys.level_size),
            )
        };

        let merged = Arc::new(MergedTrades {
            symbol: self.symbol.clone(),
            merged_at: current_time_millis(),
            venues: snapshots.iter().map(|s| s.venue.clone()).collect(),
            stats: trade_stats(&combined, self.flags),
            buys,
            sells,
            combined,
            buy_dominance,
            sell_dominance,
        });
        trace!(symbol = %self.symbol, venues = merged.venues.len(), "merged trade snapshots");
        self.last_trades = Some(Arc::clone(&merged));
        Ok(merged)
    }

    /// Merge the given open-interest snapshots (one per venue).
    pub fn merge_open_interest(
        &mut self,
        snapshots: &[Arc<OpenInterestSnapshot>],
    ) -> Result<Arc<MergedOpenInterest>, MergeError> {
        if snapshots.is_empty() {
            return Err(MergeError::NoSnapshots {
                kind: FlowKind::OpenInterest,
            });
        }
        for snapshot in snapshots {
            self.check_symbol(&snapshot.symbol)?;
        }

        let grid = merge_grids(snapshots.iter().map(|s| &s.grid))?;
        let merged = Arc::new(MergedOpenInterest {
            symbol: self.symbol.clone(),
            merged_at: current_time_millis(),
            venues: snapshots.iter().map(|s| s.venue.clone()).collect(),
            stats: open_interest_stats(&grid, self.flags),
            grid,
        });
        trace!(symbol = %self.symbol, venues = merged.venues.len(), "merged open-interest snapshots");
        self.last_open_interest = Some(Arc::clone(&merged));
        Ok(merged)
    }

    /// Merge the given liquidation snapshots (one per venue).
    pub fn merge_liquidations(
        &mut self,
        snapshots: &[Arc<LiquidationSnapshot>],
    ) -> Result<Arc<MergedLiquidations>, MergeError> {
        if snapshots.is_empty() {
            return Err(MergeError::NoSnapshots {
                kind: FlowKind::Liquidations,
            });
        }
        for snapshot in snapshots {
            self.check_symbol(&snapshot.symbol)?;
        }

        let longs = merge_grids(snapshots.iter().map(|s| &s.longs))?;
        let shorts = merge_grids(snapshots.iter().map(|s| &s.shorts))?;
        let combined = longs.combined_with(&shorts);

        let merged = Arc::new(MergedLiquidations {
            symbol: self.symbol.clone(),
            merged_at: current_time_millis(),
            venues: snapshots.iter().map(|s| s.venue.clone()).collect(),
            stats: liquidation_stats(&combined, self.flags),
            longs,
            shorts,
            combined,
        });
        trace!(symbol = %self.symbol, venues = merged.venues.len(), "merged liquidation snapshots");
        self.last_liquidations = Some(Arc::clone(&merged));
        Ok(merged)
    }

    /// Last merged books, absent until the first successful merge.
    pub fn merged_books(&self) -> Option<Arc<MergedBooks>> {
        self.last_books.clone()
    }

    /// Last merged trades, absent until the first successful merge.
    pub fn merged_trades(&self) -> Option<Arc<MergedTrades>> {
        self.last_trades.clone()
    }

    /// Last merged open interest, absent until the first successful merge.
    pub fn merged_open_interest(&self) -> Option<Arc<MergedOpenInterest>> {
        self.last_open_interest.clone()
    }

    /// Last merged liquidations, absent until the first successful merge.
    pub fn merged_liquidations(&self) -> Option<Arc<MergedLiquidations>> {
        self.last_liquidations.clone()
    }

    fn check_symbol(&self, symbol: &str) -> Result<(), MergeError> {
        if symbol != self.symbol {
            return Err(MergeError::SymbolMismatch {
                expected: self.symbol.clone(),
                actual: symbol.to_string(),
            });
        }
        Ok(())
    }
}

/// Align grids on the union of levels and sum element-wise.
///
/// The price column is taken from the last grid with a non-empty price
/// series; venues are assumed price-consistent for the same instrument, so
/// divergence is not reconciled.
fn merge_grids<'a, I>(grids: I) -> Result<HeatmapGrid, MergeError>
where
    I: Iterator<Item = &'a HeatmapGrid> + Clone,
{
    let mut iter = grids.clone();
    let first = match iter.next() {
        Some(grid) => grid,
        None => return Ok(HeatmapGrid::empty(0.0)),
    };

    let mut merged = HeatmapGrid::empty(first.level_size);
    for grid in grids.clone() {
        if grid.level_size != first.level_size {
            return Err(MergeError::LevelSizeMismatch {
                expected: first.level_size,
                actual: grid.level_size,
            });
        }
        merged.accumulate(grid);
    }

    if let Some(grid) = grids.filter(|g| g.has_price()).last() {
        merged.price = grid.price.clone();
    }
    Ok(merged)
}
