//! Flow error types

use std::fmt;

/// Errors reported by the tick-driven flows.
///
/// None of these are fatal: a rejected tick is dropped without mutating any
/// flow state, and the caller decides whether to resubmit, skip, or restart
/// the affected flow.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FlowError {
    /// A tick carried a non-finite or out-of-range numeric field.
    InvalidTick {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The tick timestamp is not a positive Unix-seconds value.
    ClockOutOfRange {
        /// The rejected timestamp.
        timestamp: i64,
    },
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::InvalidTick { field, value } => {
                write!(f, "invalid tick: field {field} has value {value}")
            }
            FlowError::ClockOutOfRange { timestamp } => {
                write!(f, "clock out of range: timestamp {timestamp}")
            }
        }
    }
}

impl std::error::Error for FlowError {}
