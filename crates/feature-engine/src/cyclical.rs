//! Cyclical hour/month encodings

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use series_normalizer::parse_timestamp;
use std::f64::consts::PI;

/// Fixed +05:30 shift applied before extracting hour and month.
///
/// This is the deployment's convention (IST) and is applied to every
/// forecast timestamp regardless of the forecast location.
pub const DEPLOYMENT_UTC_OFFSET_MINUTES: i64 = 5 * 60 + 30;

/// sin/cos encodings of hour-of-day and month-of-year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclicalTime {
    pub hour: u32,
    pub month: u32,
    pub hour_sin: f64,
    pub hour_cos: f64,
    pub month_sin: f64,
    pub month_cos: f64,
}

impl CyclicalTime {
    /// Encode an instant after applying the deployment offset
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        let shifted = instant + Duration::minutes(DEPLOYMENT_UTC_OFFSET_MINUTES);
        Self::encode(shifted.hour(), shifted.month())
    }

    /// Parse a forecast timestamp (zone-less values read as UTC) and encode it
    pub fn from_raw(raw: &str) -> Option<Self> {
        parse_timestamp(raw).ok().map(Self::from_instant)
    }

    /// Encode an hour (0-23) and month (1-12) directly
    pub fn encode(hour: u32, month: u32) -> Self {
        let h = 2.0 * PI * hour as f64 / 24.0;
        let m = 2.0 * PI * month as f64 / 12.0;
        Self {
            hour,
            month,
            hour_sin: h.sin(),
            hour_cos: h.cos(),
            month_sin: m.sin(),
            month_cos: m.cos(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_shifted_midnight_encodes_to_zero_angle() {
        // 18:30 UTC on Dec 31 is 00:00 on Jan 1 after the +05:30 shift
        let t = CyclicalTime::from_raw("2023-12-31T18:30").unwrap();
        assert_eq!((t.hour, t.month), (0, 1));
        assert!(t.hour_sin.abs() < EPS);
        assert!((t.hour_cos - 1.0).abs() < EPS);
        assert!((t.month_sin - 0.5).abs() < EPS);
    }

    #[test]
    fn test_raw_midnight_uses_shifted_hour() {
        let t = CyclicalTime::from_instant(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(t.hour, 5);
        assert!((t.hour_sin - (2.0 * PI * 5.0 / 24.0).sin()).abs() < EPS);
        assert!(t.hour_sin > 0.9);
    }

    #[test]
    fn test_shift_can_roll_month() {
        let t = CyclicalTime::from_raw("2024-03-31T20:00:00Z").unwrap();
        assert_eq!((t.hour, t.month), (1, 4));
    }

    #[test]
    fn test_unparseable_timestamp() {
        assert!(CyclicalTime::from_raw("tomorrow").is_none());
    }
}
