//! Shared formatting helpers for command output.

const NS_PER_SECOND: i64 = 1_000_000_000;

/// Renders a nanosecond duration as a compact human-readable string.
pub fn format_duration_ns(ns: i64) -> String {
    let total_seconds = ns.max(0) / NS_PER_SECOND;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Renders a 0.0..=1.0 ratio as a percentage with one decimal place.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
