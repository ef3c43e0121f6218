//! Timestamp parsing for sensor records.
//!
//! The endpoint is inconsistent about its timestamp format, so two families
//! are accepted:
//!
//! - ISO-8601 datetimes, with an offset (`2025-01-01T00:00:00Z`,
//!   `2025-01-01T02:00:00+02:00`, `2025-01-01T00:00:00+0000`) or without one
//!   (`2025-01-01T00:00:00`, `2025-01-01 00:00`), the latter read as UTC.
//! - Bare times of day (`HH:MM` or `HH:MM:SS`), placed on a caller supplied
//!   reference date in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_OF_DAY_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S"];

/// Parses a record timestamp, or returns `None` if no accepted format matches.
pub fn parse_timestamp(raw: &str, reference_date: NaiveDate) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(naive.and_utc());
    }

    TIME_OF_DAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
        .map(|time| reference_date.and_time(time).and_utc())
}
