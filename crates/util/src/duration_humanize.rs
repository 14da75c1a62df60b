//! Approximate, human-friendly rendering of elapsed time.
//!
//! Each unit is rounded independently and the first matching threshold wins,
//! so 50 seconds reads as "a minute" and 21 hours as "21 hours" while
//! 22 hours already reads as "a day". Only the magnitude is rendered: a
//! negative delta humanizes the same as its positive mirror.

use chrono::TimeDelta;

const MILLIS_PER_SECOND: f64 = 1_000.0;
const MILLIS_PER_MINUTE: f64 = 60.0 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: f64 = 60.0 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: f64 = 24.0 * MILLIS_PER_HOUR;
/// 400 Gregorian years hold 146097 days and 4800 months.
const MONTHS_PER_DAY: f64 = 4_800.0 / 146_097.0;

const FEW_SECONDS_LIMIT: f64 = 44.0;
const MINUTES_LIMIT: f64 = 45.0;
const HOURS_LIMIT: f64 = 22.0;
const DAYS_LIMIT: f64 = 26.0;
const MONTHS_LIMIT: f64 = 11.0;

/// Humanizes a time delta as a relative-duration phrase.
///
/// # Example
/// ```rust
/// use chrono::TimeDelta;
/// use orca_util::humanize_duration;
///
/// assert_eq!(humanize_duration(TimeDelta::hours(2)), "2 hours");
/// assert_eq!(humanize_duration(TimeDelta::seconds(-10)), "a few seconds");
/// ```
pub fn humanize_duration(delta: TimeDelta) -> String {
    let millis = delta.num_milliseconds().unsigned_abs() as f64;

    let seconds = (millis / MILLIS_PER_SECOND).round();
    let minutes = (millis / MILLIS_PER_MINUTE).round();
    let hours = (millis / MILLIS_PER_HOUR).round();
    let days = (millis / MILLIS_PER_DAY).round();
    let exact_months = millis / MILLIS_PER_DAY * MONTHS_PER_DAY;
    let months = exact_months.round();
    let years = (exact_months / 12.0).round();

    if seconds <= FEW_SECONDS_LIMIT {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < MINUTES_LIMIT {
        format!("{minutes} minutes")
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < HOURS_LIMIT {
        format!("{hours} hours")
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < DAYS_LIMIT {
        format!("{days} days")
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < MONTHS_LIMIT {
        format!("{months} months")
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{years} years")
    }
}
