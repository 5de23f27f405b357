//! Duration and clock formatting.

use chrono::Timelike;

/// Format a duration in seconds as `"45s"`, `"1min 5s"` or `"1h 1min 1s"`.
///
/// Rounds to the nearest second first. Units are never dropped once the
/// larger tier is reached (`"1h 0min 0s"`). Negative input is treated as zero
/// and a non-finite duration (a target that can never be completed) renders
/// as `"∞"`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "∞".to_string();
    }

    let total = seconds.max(0.0).round() as u64;
    if total < 60 {
        format!("{}s", total)
    } else if total < 3600 {
        format!("{}min {}s", total / 60, total % 60)
    } else {
        let remainder = total % 3600;
        format!(
            "{}h {}min {}s",
            total / 3600,
            remainder / 60,
            remainder % 60
        )
    }
}

/// Format a time of day as `"14h 5min 9s"` (no zero padding).
pub fn format_clock<T: Timelike>(time: &T) -> String {
    format!(
        "{}h {}min {}s",
        time.hour(),
        time.minute(),
        time.second()
    )
}
