//! Timestamp codec for persisted ISO-8601 values.
//!
//! Every timestamp written by this service uses a fixed-width UTC RFC 3339 form
//! (`2025-01-31T18:30:00.000000Z`). Fixed width keeps lexicographic order equal
//! to chronological order, which the store relies on for `ORDER BY` and for the
//! expiry comparison.

use chrono::{DateTime, Datelike, NaiveDateTime, SecondsFormat, Utc};

use crate::error::DomainError;

/// Layout SQLite uses for `CURRENT_TIMESTAMP` defaults.
const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Latest year the canonical form can hold; RFC 3339 years are four digits.
pub const MAX_STORED_YEAR: i32 = 9999;

/// Whether `ts` survives a `format_timestamp` / `parse_timestamp` round trip.
///
/// Years outside `0..=9999` render with a sign and extra digits, which neither
/// parses back nor sorts with the rest of the column.
pub fn is_storable(ts: DateTime<Utc>) -> bool {
    (0..=MAX_STORED_YEAR).contains(&ts.year())
}

/// Render a timestamp in the canonical stored form.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 (any offset, normalised to UTC) and the bare
/// `YYYY-MM-DD HH:MM:SS` layout produced by SQLite defaults (read as UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, SQLITE_TIMESTAMP)
        .map(|naive| naive.and_utc())
        .map_err(|e| DomainError::internal(format!("malformed stored timestamp '{raw}': {e}")))
}

/// Parse a stored timestamp, substituting `fallback` when it is malformed.
pub fn parse_timestamp_or(raw: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or(fallback)
}
