//! Void (canceled liquidity) inference.
//!
//! Differences the merged book heatmap against the merged trade heatmap to
//! estimate resting volume that vanished without a matching trade. Positive
//! void volume at a level means book volume disappeared there faster than
//! trades can explain — inferred cancellations. The estimate is a heuristic,
//! not an exact reconciliation: book and trade updates are not guaranteed to
//! land on the same second.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::level::Level;
use super::matrix::SLOTS;
use super::merge::{MergedBooks, MergedTrades};
use super::statistics::sample_variance;
use crate::utils::current_time_millis;

/// One-minute void estimate per price level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidSnapshot {
    /// Instrument symbol.
    pub symbol: String,
    /// Bucket width of the level keys.
    pub level_size: f64,
    /// Reference price: the merged trades' last-second price.
    pub price: f64,
    /// Sum of per-level void volume.
    pub total_void_volume: f64,
    /// Inferred canceled volume per level.
    pub void_volume: BTreeMap<Level, f64>,
    /// Sample variance of the differenced series per level.
    pub void_variance: BTreeMap<Level, f64>,
    /// Sum of per-level void variance.
    pub total_void_variance: f64,
    /// Milliseconds since epoch when the inference ran.
    pub inferred_at: u64,
}

/// Infer canceled liquidity from merged books and trades.
///
/// Aligns the two grids on the union of (second, level), computes the net
/// series `books − trades` per cell, and replaces every row but the last
/// with its forward first-difference (`net[s+1] − net[s]`); the final row
/// stays the raw net value and acts as the tail observation. Per level, the
/// void volume is the sum of the differenced series and the void variance
/// its sample variance.
///
/// Empty merged grids (an all-zero minute) produce an all-zero snapshot, the
/// valid degenerate result; absence is the merge layer's concern.
pub fn infer_voids(books: &MergedBooks, trades: &MergedTrades) -> VoidSnapshot {
    let book_grid = &books.grid;
    let trade_grid = &trades.combined;

    let levels: Vec<Level> = {
        let mut all: Vec<Level> = book_grid.levels().chain(trade_grid.levels()).collect();
        all.sort_unstable();
        all.dedup();
        all
    };

    let mut void_volume = BTreeMap::new();
    let mut void_variance = BTreeMap::new();
    for level in levels {
        let mut net: Vec<f64> = (0..SLOTS)
            .map(|slot| book_grid.cell(slot as u8, level) - trade_grid.cell(slot as u8, level))
            .collect();
        for slot in 0..SLOTS - 1 {
            net[slot] = net[slot + 1] - net[slot];
        }

        void_volume.insert(level, net.iter().sum::<f64>());
        void_variance.insert(level, sample_variance(&net));
    }

    let total_void_volume = void_volume.values().sum();
    let total_void_variance = void_variance.values().sum();
    trace!(symbol = %books.symbol, levels = void_volume.len(), "inferred void volume");

    VoidSnapshot {
        symbol: books.symbol.clone(),
        level_size: book_grid.level_size,
        price: trade_grid.last_price(),
        total_void_volume,
        void_volume,
        void_variance,
        total_void_variance,
        inferred_at: current_time_millis(),
    }
}
