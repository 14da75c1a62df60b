//! # Date Handling Utilities
//!
//! Formatting helpers for instance timestamps. Timestamps are rendered in the
//! `M/D/YYYY, h:mm:ss AM` shape used by the instance detail pane, converted
//! into the caller's time zone first.

use chrono::{DateTime, TimeZone, Utc};

use orca_types::VALUE_UNAVAILABLE;

const LOCALE_TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Formats a UTC timestamp in the given time zone.
///
/// # Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use orca_util::date_handling::format_locale_timestamp;
///
/// let started = Utc.with_ymd_and_hms(2024, 1, 1, 14, 5, 9).unwrap();
/// assert_eq!(format_locale_timestamp(&started, &Utc), "1/1/2024, 2:05:09 PM");
/// ```
pub fn format_locale_timestamp<Tz>(timestamp: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    timestamp.with_timezone(zone).format(LOCALE_TIMESTAMP_FORMAT).to_string()
}

/// Formats an optional timestamp, falling back to the `unavailable` sentinel.
pub fn format_optional_timestamp<Tz>(timestamp: Option<&DateTime<Utc>>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    timestamp
        .map(|timestamp| format_locale_timestamp(timestamp, zone))
        .unwrap_or_else(|| VALUE_UNAVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn formats_midnight_as_twelve_am() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_locale_timestamp(&midnight, &Utc), "1/1/2024, 12:00:00 AM");
    }

    #[test]
    fn converts_into_requested_zone() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_locale_timestamp(&instant, &plus_two), "3/11/2024, 1:30:00 AM");
    }

    #[test]
    fn missing_timestamp_uses_sentinel() {
        assert_eq!(format_optional_timestamp(None, &Utc), "unavailable");
    }
}
