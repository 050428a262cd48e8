//! Time utility functions

use chrono::Utc;

/// Convert nanoseconds since Unix epoch to milliseconds
pub fn nanos_to_millis(nanos: u64) -> i64 {
    (nanos / 1_000_000) as i64
}

/// Current wall-clock time in milliseconds since Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
