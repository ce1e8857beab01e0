//! Price-to-level bucketing.
//!
//! A level is the upper bound of a price bucket of width `level_size`:
//! prices in `(0, level_size]` map to `level_size`, prices in
//! `(level_size, 2 * level_size]` map to `2 * level_size`, and so forth.
//! Levels are keyed by their integer bucket index so that alignment across
//! venues is exact regardless of floating-point noise in raw prices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discretized price level, keyed by bucket index.
///
/// The index is `ceil(price / level_size)`; the price this level represents
/// (the bucket upper bound) is `index * level_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(i64);

impl Level {
    /// Bucket a raw price into its aggregation level.
    pub fn bucket(price: f64, level_size: f64) -> Self {
        Self((price / level_size).ceil() as i64)
    }

    /// Construct from a raw bucket index.
    pub fn from_index(index: i64) -> Self {
        Self(index)
    }

    /// The integer bucket index.
    pub fn index(self) -> i64 {
        self.0
    }

    /// The price this level represents (the bucket upper bound).
    pub fn price(self, level_size: f64) -> f64 {
        self.0 as f64 * level_size
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signed percentage distance of `price` from `reference`.
pub fn percent_distance(price: f64, reference: f64) -> f64 {
    100.0 * (price - reference) / reference
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_to_upper_bound() {
        let level = Level::bucket(101.0, 20.0);
        assert_eq!(level.price(20.0), 120.0);

        let level = Level::bucket(119.9, 20.0);
        assert_eq!(level.price(20.0), 120.0);
    }

    #[test]
    fn exact_multiple_stays_on_its_level() {
        // price == level_size buckets to level_size, not 2 * level_size
        let level = Level::bucket(20.0, 20.0);
        assert_eq!(level.price(20.0), 20.0);

        let level = Level::bucket(120.0, 20.0);
        assert_eq!(level.price(20.0), 120.0);
    }

    #[test]
    fn percent_distance_is_signed() {
        assert_eq!(percent_distance(105.0, 100.0), 5.0);
        assert_eq!(percent_distance(95.0, 100.0), -5.0);
    }
}
