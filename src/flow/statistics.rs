//! Derived statistics over merged heatmaps.
//!
//! Each merged output carries a kind-specific statistics block computed in a
//! single pass over the grid. [`StatFlags`] selects which statistics are
//! calculated, so callers that only need a subset avoid the extra passes.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::level::Level;
use super::matrix::{HeatmapGrid, SLOTS};

bitflags! {
    /// Flags for selecting which statistics to derive from a merged heatmap.
    ///
    /// Multiple flags can be combined using bitwise OR.
    ///
    /// # Examples
    /// ```
    /// use tickflow_rs::StatFlags;
    ///
    /// // Only OHLC and total volume
    /// let flags = StatFlags::OHLC | StatFlags::VOLUME;
    ///
    /// // Everything
    /// let flags = StatFlags::ALL;
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct StatFlags: u32 {
        /// Open/high/low/close over the price column.
        const OHLC = 1 << 0;

        /// Sample variance of the price column.
        const PRICE_VARIANCE = 1 << 1;

        /// Per-level sample variance across the 60 seconds.
        const LEVEL_VARIANCE = 1 << 2;

        /// The last row's per-level values (current resting shape).
        const SHAPE = 1 << 3;

        /// Scalar volume totals.
        const VOLUME = 1 << 4;

        /// Buy/sell dominance grids for trades.
        const DOMINANCE = 1 << 5;

        /// Calculate all statistics.
        const ALL = Self::OHLC.bits() | Self::PRICE_VARIANCE.bits()
                  | Self::LEVEL_VARIANCE.bits() | Self::SHAPE.bits()
                  | Self::VOLUME.bits() | Self::DOMINANCE.bits();
    }
}

/// Open/high/low/close of a filled price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceOhlc {
    /// First slot's price.
    pub open: f64,
    /// Maximum price over the minute.
    pub high: f64,
    /// Minimum price over the minute.
    pub low: f64,
    /// Last slot's price.
    pub close: f64,
}

impl PriceOhlc {
    /// Compute OHLC over a price series. An all-zero (empty-minute) series
    /// yields all-zero OHLC, the valid degenerate result.
    pub fn from_series(prices: &[f64]) -> Self {
        if prices.is_empty() {
            return Self {
                open: 0.0,
                high: 0.0,
                low: 0.0,
                close: 0.0,
            };
        }
        Self {
            open: prices[0],
            high: prices.iter().copied().fold(f64::MIN, f64::max),
            low: prices.iter().copied().fold(f64::MAX, f64::min),
            close: prices[prices.len() - 1],
        }
    }
}

/// Sample variance (n − 1 denominator) of a series. Zero for fewer than two
/// observations.
pub fn sample_variance(series: &[f64]) -> f64 {
    let n = series.len();
    if n < 2 {
        return 0.0;
    }
    let mean = series.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = series.iter().map(|x| (x - mean) * (x - mean)).sum();
    sum_sq / (n - 1) as f64
}

/// Per-level sample variance, skipping columns that are identically zero for
/// the whole minute.
pub(crate) fn level_variances(grid: &HeatmapGrid) -> BTreeMap<Level, f64> {
    grid.columns
        .iter()
        .filter(|(_, column)| column.iter().any(|&v| v != 0.0))
        .map(|(&level, column)| (level, sample_variance(column)))
        .collect()
}

/// Per-level sums, skipping columns that are identically zero.
pub(crate) fn level_totals(grid: &HeatmapGrid) -> BTreeMap<Level, f64> {
    grid.columns
        .iter()
        .filter(|(_, column)| column.iter().any(|&v| v != 0.0))
        .map(|(&level, column)| (level, column.iter().sum()))
        .collect()
}

/// Statistics derived from a merged book heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookStats {
    /// OHLC of the reference price.
    pub ohlc: Option<PriceOhlc>,
    /// Sample variance of the reference price over the minute.
    pub price_variance: Option<f64>,
    /// Per-level sample variance of resting volume.
    pub level_variance: BTreeMap<Level, f64>,
    /// The last second's per-level resting volume.
    pub resting_shape: BTreeMap<Level, f64>,
}

/// Build book statistics for the selected flags.
pub fn book_stats(grid: &HeatmapGrid, flags: StatFlags) -> BookStats {
    BookStats {
        ohlc: flags
            .contains(StatFlags::OHLC)
            .then(|| PriceOhlc::from_series(&grid.price)),
        price_variance: flags
            .contains(StatFlags::PRICE_VARIANCE)
            .then(|| sample_variance(&grid.price)),
        level_variance: if flags.contains(StatFlags::LEVEL_VARIANCE) {
            level_variances(grid)
        } else {
            BTreeMap::new()
        },
        resting_shape: if flags.contains(StatFlags::SHAPE) {
            grid.last_row()
        } else {
            BTreeMap::new()
        },
    }
}

/// Statistics derived from a merged trade heatmap.
///
/// A high variance at one level suggests a block concentrated in a few
/// seconds rather than steady flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    /// Total traded volume over the minute, both sides.
    pub total_volume: f64,
    /// Per-level sample variance of traded volume.
    pub level_variance: BTreeMap<Level, f64>,
}

/// Build trade statistics for the selected flags over the combined grid.
pub fn trade_stats(combined: &HeatmapGrid, flags: StatFlags) -> TradeStats {
    TradeStats {
        total_volume: if flags.contains(StatFlags::VOLUME) {
            combined.total()
        } else {
            0.0
        },
        level_variance: if flags.contains(StatFlags::LEVEL_VARIANCE) {
            level_variances(combined)
        } else {
            BTreeMap::new()
        },
    }
}

/// Statistics derived from a merged open-interest heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestStats {
    /// Net open-interest change over the minute (sum of deltas).
    pub net_change: f64,
    /// Per-level sample variance of the delta distribution.
    pub level_variance: BTreeMap<Level, f64>,
}

/// Build open-interest statistics for the selected flags.
pub fn open_interest_stats(grid: &HeatmapGrid, flags: StatFlags) -> OpenInterestStats {
    OpenInterestStats {
        net_change: if flags.contains(StatFlags::VOLUME) {
            grid.total()
        } else {
            0.0
        },
        level_variance: if flags.contains(StatFlags::LEVEL_VARIANCE) {
            level_variances(grid)
        } else {
            BTreeMap::new()
        },
    }
}

/// Statistics derived from a merged liquidation heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationStats {
    /// Total liquidated volume over the minute, both sides.
    pub total_volume: f64,
    /// Per-level liquidated volume.
    pub level_totals: BTreeMap<Level, f64>,
}

/// Build liquidation statistics for the selected flags over the combined
/// grid. No variance is derived for liquidations.
pub fn liquidation_stats(combined: &HeatmapGrid, flags: StatFlags) -> LiquidationStats {
    LiquidationStats {
        total_volume: if flags.contains(StatFlags::VOLUME) {
            combined.total()
        } else {
            0.0
        },
        level_totals: if flags.contains(StatFlags::VOLUME) {
            level_totals(combined)
        } else {
            BTreeMap::new()
        },
    }
}

/// Cell-wise dominance grids over the union of levels.
///
/// `buy_dominance` is `max(buys − sells, 0)` and `sell_dominance` is
/// `min(sells − buys, 0)`: the net-aggressive series clipped so that buy
/// pressure renders as positive cells and its mirror as non-positive cells.
pub fn dominance(buys: &HeatmapGrid, sells: &HeatmapGrid) -> (HeatmapGrid, HeatmapGrid) {
    let mut buy_dominance = HeatmapGrid::empty(buys.level_size);
    let mut sell_dominance = HeatmapGrid::empty(buys.level_size);

    let levels: Vec<Level> = {
        let mut all: Vec<Level> = buys.levels().chain(sells.levels()).collect();
        all.sort_unstable();
        all.dedup();
        all
    };

    for level in levels {
        let mut buy_column = vec![0.0; SLOTS];
        let mut sell_column = vec![0.0; SLOTS];
        for slot in 0..SLOTS {
            let net = buys.cell(slot as u8, level) - sells.cell(slot as u8, level);
            buy_column[slot] = net.max(0.0);
            sell_column[slot] = (-net).min(0.0);
        }
        buy_dominance.columns.insert(level, buy_column);
        sell_dominance.columns.insert(level, sell_column);
    }

    let price: Vec<f64> = buys
        .price
        .iter()
        .zip(&sells.price)
        .map(|(&b, &s)| if b != 0.0 { b } else { s })
        .collect();
    buy_dominance.price = price.clone();
    sell_dominance.price = price;

    (buy_dominance, sell_dominance)
}
