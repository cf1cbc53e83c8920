//! Timestamp helpers used by the matcher.
//!
//! Every helper accepts `Option<NaiveDateTime>`; `None` stands for a missing or
//! unparsable source timestamp and degrades to a neutral answer instead of
//! failing.

use chrono::{DateTime, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a source timestamp. RFC 3339 values keep their own wall-clock time
/// (the offset is dropped); naive values are taken as-is.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// True when both timestamps are valid and fall on the same calendar day.
pub fn same_day(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.date() == b.date(),
        _ => false,
    }
}

/// Whole minutes between two timestamps, rounded down. Zero if either is invalid.
pub fn time_difference_minutes(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> i64 {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).num_seconds().abs() / 60,
        _ => 0,
    }
}

/// `HH:MM`, or `--:--` for an invalid timestamp.
pub fn format_time(t: Option<NaiveDateTime>) -> String {
    match t {
        Some(t) => t.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}
