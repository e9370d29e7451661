//! Timestamp parsing for mixed ISO shapes

use crate::error::SeriesError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Shapes carrying an explicit offset or `Z`
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Zone-less shapes; interpreted as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a raw period timestamp into a UTC instant.
///
/// A value without a zone suffix is read as if `Z` had been appended, so
/// `"2023-06-15T10:00:00"` and `"2023-06-15T10:00:00Z"` are the same instant.
/// A bare date resolves to midnight UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SeriesError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(SeriesError::InvalidTimestamp(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| SeriesError::InvalidTimestamp(raw.to_string()))
}
