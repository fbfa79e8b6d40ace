//! Timestamp formatting for `lastmod` values.
//!
//! Values are RFC 3339 with second precision and a numeric offset, e.g.
//! `2025-06-01T14:03:22+02:00`. Within one offset, string order equals
//! chronological order.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// `strftime` pattern of every written `lastmod` value.
pub const LASTMOD_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Format `dt` as a `lastmod` value.
pub fn format_lastmod<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    dt.format(LASTMOD_FORMAT).to_string()
}

/// Convert Unix milliseconds into a datetime in `tz`.
pub fn from_millis<Tz: TimeZone>(millis: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(millis).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_format_lastmod_utc() {
        let dt = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(format_lastmod(&dt), "2025-06-01T00:00:00+00:00");
    }

    #[test]
    fn test_format_lastmod_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let dt = tz.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(format_lastmod(&dt), "2024-12-31T23:59:59+02:00");
    }

    #[test]
    fn test_from_millis_truncates_to_seconds() {
        let dt = from_millis(1_748_736_000_999, &Utc).unwrap();
        assert_eq!(format_lastmod(&dt), "2025-06-01T00:00:00+00:00");
    }

    #[test]
    fn test_lexicographic_matches_chronological() {
        let earlier = format_lastmod(&from_millis(1_700_000_000_000, &Utc).unwrap());
        let later = format_lastmod(&from_millis(1_700_000_001_000, &Utc).unwrap());
        assert!(later > earlier);
    }
}
