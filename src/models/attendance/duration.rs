use chrono::{NaiveTime, Timelike};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse a wall-clock reading into minutes after midnight.
/// Accepts `HH:MM`, `H:MM` and `HH:MM:SS` (seconds are ignored).
pub fn parse_clock(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let time = NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()?;
    Some(time.hour() * 60 + time.minute())
}

/// Elapsed minutes from arrival to departure. A departure earlier than the
/// arrival is read as the next day.
pub fn elapsed_minutes(arrival: &str, departure: &str) -> Option<u32> {
    let start = parse_clock(arrival)?;
    let end = parse_clock(departure)?;
    if end >= start {
        Some(end - start)
    } else {
        Some(end + MINUTES_PER_DAY - start)
    }
}

/// Render minutes as `"9h 30m"`, `"4h"`, `"45m"` or `"0m"`.
pub fn format_minutes(total: u32) -> String {
    let hours = total / 60;
    let minutes = total % 60;
    match (hours, minutes) {
        (0, 0) => "0m".to_string(),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Formatted duration of an attendance record, or `None` when either time
/// is missing or unreadable.
pub fn duration(arrival: Option<&str>, departure: Option<&str>) -> Option<String> {
    elapsed_minutes(arrival?, departure?).map(format_minutes)
}
