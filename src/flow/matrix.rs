//! Rolling one-minute accumulation matrix.
//!
//! [`MinuteMatrix`] holds one row per wall-clock second of the current minute
//! (always exactly 60) and one column per price level discovered since the
//! last reset, plus a distinguished per-second reference price. Rollover is
//! detected by a [`SecondCursor`], and [`MinuteMatrix::freeze`] produces an
//! immutable [`HeatmapGrid`] with the gap-fill policy applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::level::Level;

/// Number of second slots in one minute.
pub const SLOTS: usize = 60;

/// How a cell write combines with the existing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the cell with the new amount.
    Overwrite,
    /// Add the new amount to the existing cell value.
    Accumulate,
}

/// Which columns receive the gap fill at freeze time.
///
/// The price column is always filled. Level columns are filled only for
/// flows whose cells represent resting state (order books), where "no update
/// this second" should repeat the last known amount; for event flows a zero
/// cell genuinely means no activity that second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// Fill only the price column.
    PriceOnly,
    /// Fill the price column and every level column.
    All,
}

/// Which level columns survive a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Remove every level column; the next minute starts empty.
    Drop,
    /// Keep the column set but zero every cell. Used by flows whose amounts
    /// are deltas of a cumulative series and whose level set accrues across
    /// minutes.
    RetainLevels,
}

/// Tracks the previously observed second to detect minute rollover.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecondCursor {
    previous: Option<u8>,
}

impl SecondCursor {
    /// A cursor that has not yet observed any second.
    pub fn new() -> Self {
        Self { previous: None }
    }

    /// Advance to `slot`, returning `true` when the clock wrapped past :59
    /// back toward :00 (the new second is strictly smaller than the last one
    /// observed). Equal or increasing seconds are normal progression.
    ///
    /// An out-of-order tick within the same minute is indistinguishable from
    /// a true rollover under this rule; per-venue feeds are expected to
    /// deliver ticks in order.
    pub fn advance(&mut self, slot: u8) -> bool {
        let rollover = matches!(self.previous, Some(prev) if slot < prev);
        self.previous = Some(slot);
        rollover
    }

    /// The last second observed, if any.
    pub fn previous(&self) -> Option<u8> {
        self.previous
    }
}

/// The mutable second × level accumulation structure for one minute.
#[derive(Debug, Clone)]
pub struct MinuteMatrix {
    level_size: f64,
    price: Vec<f64>,
    columns: BTreeMap<Level, Vec<f64>>,
}

impl MinuteMatrix {
    /// An empty matrix with 60 zeroed slots and no level columns.
    pub fn new(level_size: f64) -> Self {
        Self {
            level_size,
            price: vec![0.0; SLOTS],
            columns: BTreeMap::new(),
        }
    }

    /// Bucket width of the level columns.
    pub fn level_size(&self) -> f64 {
        self.level_size
    }

    /// Number of level columns currently known.
    pub fn level_count(&self) -> usize {
        self.columns.len()
    }

    /// True when no price and no amounts have been recorded this minute.
    pub fn is_empty(&self) -> bool {
        self.columns.values().all(|c| c.iter().all(|&v| v == 0.0))
            && self.price.iter().all(|&v| v == 0.0)
    }

    /// Record the reference price for a slot. Last write wins within a slot.
    pub fn record_price(&mut self, slot: u8, price: f64) {
        self.price[slot as usize] = price;
    }

    /// The reference price recorded for a slot, zero when unset.
    pub fn price_at(&self, slot: u8) -> f64 {
        self.price[slot as usize]
    }

    /// Amount at `(slot, level)`, zero for unknown levels.
    pub fn cell(&self, slot: u8, level: Level) -> f64 {
        self.columns
            .get(&level)
            .map(|c| c[slot as usize])
            .unwrap_or(0.0)
    }

    /// Known levels in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.columns.keys().copied()
    }

    /// Write `amount` into `(slot, level)`.
    ///
    /// An unknown level gets a zero-valued column across all 60 slots before
    /// the write, so earlier seconds of the minute retroactively carry an
    /// explicit zero for it.
    pub fn observe(&mut self, slot: u8, level: Level, amount: f64, mode: WriteMode) {
        let column = self
            .columns
            .entry(level)
            .or_insert_with(|| vec![0.0; SLOTS]);
        let cell = &mut column[slot as usize];
        match mode {
            WriteMode::Overwrite => *cell = amount,
            WriteMode::Accumulate => *cell += amount,
        }
    }

    /// Replace an entire row with the given per-level sums.
    ///
    /// Columns absent from `sums` are zeroed for this slot; unknown levels
    /// are added first. This is the full-recompute write used by the book
    /// flow, where each row holds the latest resting shape of the book.
    pub fn overwrite_row(&mut self, slot: u8, sums: &BTreeMap<Level, f64>) {
        for column in self.columns.values_mut() {
            column[slot as usize] = 0.0;
        }
        for (&level, &amount) in sums {
            self.observe(slot, level, amount, WriteMode::Overwrite);
        }
    }

    /// Freeze the matrix into an immutable [`HeatmapGrid`], applying `fill`.
    pub fn freeze(&self, fill: FillPolicy) -> HeatmapGrid {
        let mut price = self.price.clone();
        fill_series(&mut price);

        let mut columns = self.columns.clone();
        if fill == FillPolicy::All {
            for column in columns.values_mut() {
                fill_series(column);
            }
        }

        trace!(levels = columns.len(), "froze minute matrix");
        HeatmapGrid {
            level_size: self.level_size,
            price,
            columns,
        }
    }

    /// Reset for the next minute.
    pub fn reset(&mut self, policy: ResetPolicy) {
        self.price.fill(0.0);
        match policy {
            ResetPolicy::Drop => self.columns.clear(),
            ResetPolicy::RetainLevels => {
                for column in self.columns.values_mut() {
                    column.fill(0.0);
                }
            }
        }
    }
}

/// Forward-fill zero cells from the nearest prior non-zero value, then
/// backward-fill any still-zero leading cells from the nearest following
/// non-zero value. Zero is the "unset" sentinel; a series with no non-zero
/// value stays all zero.
fn fill_series(series: &mut [f64]) {
    let mut last = 0.0;
    for cell in series.iter_mut() {
        if *cell == 0.0 {
            *cell = last;
        } else {
            last = *cell;
        }
    }
    let mut next = 0.0;
    for cell in series.iter_mut().rev() {
        if *cell == 0.0 {
            *cell = next;
        } else {
            next = *cell;
        }
    }
}

/// An immutable second × level heatmap: one minute of per-level amounts plus
/// the per-second reference price, frozen at a minute rollover or produced
/// by a cross-venue merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    /// Bucket width the level columns were aggregated with.
    pub level_size: f64,
    /// Reference price per second slot, gap-filled at freeze time.
    pub price: Vec<f64>,
    /// Per-level amount columns, sorted ascending by level.
    pub columns: BTreeMap<Level, Vec<f64>>,
}

impl HeatmapGrid {
    /// A grid with 60 zeroed price slots and no level columns.
    pub fn empty(level_size: f64) -> Self {
        Self {
            level_size,
            price: vec![0.0; SLOTS],
            columns: BTreeMap::new(),
        }
    }

    /// Amount at `(slot, level)`, zero for unknown levels.
    pub fn cell(&self, slot: u8, level: Level) -> f64 {
        self.columns
            .get(&level)
            .map(|c| c[slot as usize])
            .unwrap_or(0.0)
    }

    /// The 60-slot column for `level`, if known.
    pub fn column(&self, level: Level) -> Option<&[f64]> {
        self.columns.get(&level).map(|c| c.as_slice())
    }

    /// Known levels in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.columns.keys().copied()
    }

    /// Number of level columns.
    pub fn level_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the grid holds no price and no amounts.
    pub fn is_empty(&self) -> bool {
        self.columns.values().all(|c| c.iter().all(|&v| v == 0.0)) && !self.has_price()
    }

    /// True when any price slot is non-zero.
    pub fn has_price(&self) -> bool {
        self.price.iter().any(|&p| p != 0.0)
    }

    /// The last slot's reference price.
    pub fn last_price(&self) -> f64 {
        self.price[SLOTS - 1]
    }

    /// Sum of every amount cell across all levels and slots.
    pub fn total(&self) -> f64 {
        self.columns
            .values()
            .map(|c| c.iter().sum::<f64>())
            .sum()
    }

    /// The last slot's per-level amounts.
    pub fn last_row(&self) -> BTreeMap<Level, f64> {
        self.columns
            .iter()
            .map(|(&level, column)| (level, column[SLOTS - 1]))
            .collect()
    }

    /// Element-wise add `other` into this grid over the union of levels.
    /// Levels missing on either side are treated as zero. The price column
    /// is left untouched; callers choose it separately.
    pub fn accumulate(&mut self, other: &HeatmapGrid) {
        for (&level, column) in &other.columns {
            let target = self
                .columns
                .entry(level)
                .or_insert_with(|| vec![0.0; SLOTS]);
            for (cell, value) in target.iter_mut().zip(column) {
                *cell += value;
            }
        }
    }

    /// Combine this grid with `other` by summing cells over the union of
    /// levels. The price column is coalesced per slot, preferring this
    /// grid's value where non-zero.
    pub fn combined_with(&self, other: &HeatmapGrid) -> HeatmapGrid {
        let mut combined = self.clone();
        combined.accumulate(other);
        for (slot, cell) in combined.price.iter_mut().enumerate() {
            if *cell == 0.0 {
                *cell = other.price[slot];
            }
        }
        combined
    }
}
