//! Normalized tick records consumed by the flows.
//!
//! Venue wire formats are decoded by external adapters; the flows only ever
//! see these already-normalized records. Timestamps are Unix seconds on the
//! venue-supplied clock — the core trusts them and performs no cross-venue
//! clock reconciliation.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::FlowError;
use crate::utils::second_of_minute;

/// Aggressor side of a trade or liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buyer was the aggressor.
    Buy,
    /// Seller was the aggressor.
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// The four tick kinds a venue feed produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Order-book depth updates.
    Books,
    /// Executed trades.
    Trades,
    /// Cumulative open-interest readings.
    OpenInterest,
    /// Forced liquidations.
    Liquidations,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowKind::Books => write!(f, "books"),
            FlowKind::Trades => write!(f, "trades"),
            FlowKind::OpenInterest => write!(f, "open_interest"),
            FlowKind::Liquidations => write!(f, "liquidations"),
        }
    }
}

/// A batch of order-book deltas: `(price, amount)` pairs per side, where an
/// amount of zero removes the resting entry at that price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookUpdate {
    /// Unix seconds on the venue clock.
    pub timestamp: i64,
    /// Bid-side deltas.
    pub bids: Vec<(f64, f64)>,
    /// Ask-side deltas.
    pub asks: Vec<(f64, f64)>,
}

/// One executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeTick {
    /// Unix seconds on the venue clock.
    pub timestamp: i64,
    /// Aggressor side.
    pub side: Side,
    /// Execution price.
    pub price: f64,
    /// Executed quantity.
    pub amount: f64,
}

/// One cumulative open-interest reading. Carries the absolute OI level, not
/// a delta; the flow differences consecutive readings itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestTick {
    /// Unix seconds on the venue clock.
    pub timestamp: i64,
    /// Reference price at the reading.
    pub price: f64,
    /// Absolute open interest.
    pub open_interest: f64,
}

/// One forced liquidation. A `Buy` side liquidates a short position, a
/// `Sell` side liquidates a long position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidationTick {
    /// Unix seconds on the venue clock.
    pub timestamp: i64,
    /// Position side being closed, expressed as the aggressor side.
    pub side: Side,
    /// Liquidation price.
    pub price: f64,
    /// Liquidated quantity.
    pub amount: f64,
}

/// Map a timestamp to its second-of-minute slot, rejecting non-positive
/// clock values.
pub(crate) fn slot_for(timestamp: i64) -> Result<u8, FlowError> {
    if timestamp <= 0 {
        return Err(FlowError::ClockOutOfRange { timestamp });
    }
    Ok(second_of_minute(timestamp))
}

pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<(), FlowError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(FlowError::InvalidTick { field, value });
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), FlowError> {
    if !value.is_finite() || value < 0.0 {
        return Err(FlowError::InvalidTick { field, value });
    }
    Ok(())
}
