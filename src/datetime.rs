//! Date/time utilities for GradeTrack.
//!
//! Timestamps are persisted as UTC TEXT columns and compared in Rust, so
//! expiry decisions always go through the injected clock rather than SQL.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage format for timestamp columns (SQLite datetime style).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC datetime for storage.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp back into a UTC datetime.
///
/// Accepts the storage format and RFC3339 as a fallback. Returns `None` if
/// the value is unparseable.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}
