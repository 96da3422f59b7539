use chrono::{TimeZone, Utc};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable byte count using 1024 steps: one decimal below 10,
/// none above.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if value >= 10.0 || unit == 0 {
        format!("{:.0} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Unix seconds rendered as a UTC timestamp; unknown times render as "-".
pub fn format_timestamp(seconds: Option<i64>) -> String {
    match seconds.filter(|s| *s > 0).and_then(|s| Utc.timestamp_opt(s, 0).single()) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "-".to_string(),
    }
}
