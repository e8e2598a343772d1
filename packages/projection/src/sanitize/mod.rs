use chrono::{DateTime, Duration, Utc};

use crate::error::{EngineError, Result};

/// Parse an ISO-8601 timestamp from the service. Malformed values are an
/// error, never coerced.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| EngineError::InvalidTimestamp {
            field,
            value: value.to_string(),
            source,
        })
}

pub fn parse_optional_timestamp(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(field, v)).transpose()
}

pub fn check_level(level: u32, max_level: u32) -> Result<u32> {
    if (1..=max_level).contains(&level) {
        Ok(level)
    } else {
        Err(EngineError::InvalidLevel {
            level,
            max: max_level,
        })
    }
}

/// Whole seconds from `now` until `at`, clamped at zero.
pub fn seconds_until(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (at - now).num_seconds().max(0)
}

/// `at + millis`, or an error when the sum leaves chrono's range.
pub fn add_millis(field: &'static str, at: DateTime<Utc>, millis: i64) -> Result<DateTime<Utc>> {
    Duration::try_milliseconds(millis)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or(EngineError::TimeOutOfRange { field })
}

/// `at + seconds`, or an error when the sum leaves chrono's range.
pub fn add_seconds(field: &'static str, at: DateTime<Utc>, seconds: i64) -> Result<DateTime<Utc>> {
    Duration::try_seconds(seconds)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or(EngineError::TimeOutOfRange { field })
}

/// Replace NaN or negative day counts with zero.
pub fn sanitize_days(days: f64) -> f64 {
    if days.is_finite() && days > 0.0 {
        days
    } else {
        0.0
    }
}
