//! Small shared utilities.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Second-of-minute slot (0..=59) for a Unix-seconds timestamp.
pub(crate) fn second_of_minute(timestamp: i64) -> u8 {
    timestamp.rem_euclid(60) as u8
}
