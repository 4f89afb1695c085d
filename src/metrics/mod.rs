pub mod change_failure;
pub mod coverage;
pub mod lead_time;
pub mod run_stats;

use chrono::{DateTime, Utc};

/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole * 100` rounded to two decimals, or `0` for an empty whole.
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

/// Calendar-date bucket key in UTC, e.g. `2024-03-01`.
pub fn date_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}
