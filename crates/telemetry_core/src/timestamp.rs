use chrono::{DateTime, NaiveDateTime, Utc};

use crate::contract::ValidationError;

/// Renders epoch milliseconds as a UTC ISO-8601 string with a literal `Z`.
///
/// Whole seconds render without a fraction; anything else renders six
/// fractional digits (`2024-01-01T00:00:00.250000Z`).
pub fn iso_utc_from_millis(timestamp_ms: i64) -> Result<String, ValidationError> {
    let datetime = DateTime::<Utc>::from_timestamp_millis(timestamp_ms).ok_or_else(|| {
        ValidationError::new(format!("timestamp {timestamp_ms} is out of range"))
    })?;

    let civil = if timestamp_ms.rem_euclid(1_000) == 0 {
        datetime.format("%Y-%m-%dT%H:%M:%S")
    } else {
        datetime.format("%Y-%m-%dT%H:%M:%S%.6f")
    };
    Ok(format!("{civil}Z"))
}

/// Inverse of [`iso_utc_from_millis`], truncating below one millisecond.
pub fn millis_from_iso_utc(text: &str) -> Result<i64, ValidationError> {
    let civil = text
        .strip_suffix('Z')
        .ok_or_else(|| ValidationError::new(format!("timestamp '{text}' lacks a Z suffix")))?;
    let parsed = NaiveDateTime::parse_from_str(civil, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|error| ValidationError::new(format!("invalid timestamp '{text}': {error}")))?;
    Ok(parsed.and_utc().timestamp_millis())
}
