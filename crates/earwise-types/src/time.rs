//! Microsecond helpers shared by every crate.
//!
//! The engine keeps all times as `i64` microseconds; seconds only appear in
//! configuration and in outbound results.

pub const US_PER_SECOND: i64 = 1_000_000;
pub const US_PER_MINUTE: i64 = 60 * US_PER_SECOND;

/// Convert seconds to microseconds, rounding to the nearest microsecond.
pub fn secs_to_us(secs: f64) -> i64 {
    (secs * US_PER_SECOND as f64).round() as i64
}

pub fn us_to_secs(us: i64) -> f64 {
    us as f64 / US_PER_SECOND as f64
}
