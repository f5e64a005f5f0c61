//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Get the number of seconds between two instants, which is negative if `to`
/// is before `from`.
pub fn secs_between(from: std::time::Instant, to: std::time::Instant) -> f64 {
    if to >= from {
        (to - from).as_secs_f64()
    }
    else {
        -(from - to).as_secs_f64()
    }
}
