use crate::contract::ValidationError;

pub const MS_PER_HOUR: i64 = 3_600_000;

/// Parses the `hours` query parameter, falling back to `default_hours`.
pub fn parse_hours(raw: Option<&str>, default_hours: i64) -> Result<i64, ValidationError> {
    match raw {
        None => Ok(default_hours),
        Some(text) => text.trim().parse::<i64>().map_err(|_| {
            ValidationError::new(format!("hours must be a whole number, got '{text}'"))
        }),
    }
}

/// Inclusive `[start_ms, end_ms]` range over the timestamp sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    pub fn trailing_hours(now_ms: i64, hours: i64) -> Result<Self, ValidationError> {
        let span_ms = hours
            .checked_mul(MS_PER_HOUR)
            .ok_or_else(|| ValidationError::new(format!("hours={hours} overflows the window")))?;
        let start_ms = now_ms
            .checked_sub(span_ms)
            .ok_or_else(|| ValidationError::new(format!("hours={hours} overflows the window")))?;
        Ok(Self {
            start_ms,
            end_ms: now_ms,
        })
    }

    /// An inverted window (negative hours) can never match a reading.
    pub fn is_empty(&self) -> bool {
        self.start_ms > self.end_ms
    }

    /// Encodes the window as string sort-key bounds.
    ///
    /// Timestamps are stored as decimal strings, so the store compares them
    /// lexicographically. That ordering only agrees with numeric ordering when
    /// both bounds have the same number of digits and neither is negative.
    pub fn sort_key_range(&self) -> Result<SortKeyRange, ValidationError> {
        if self.start_ms < 0 {
            return Err(ValidationError::new(format!(
                "window start {} precedes the epoch",
                self.start_ms
            )));
        }

        let start = encode_sort_key(self.start_ms);
        let end = encode_sort_key(self.end_ms);
        if start.len() != end.len() {
            return Err(ValidationError::new(format!(
                "window bounds {start} and {end} have different sort key widths"
            )));
        }

        Ok(SortKeyRange { start, end })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKeyRange {
    start: String,
    end: String,
}

impl SortKeyRange {
    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }
}

pub fn encode_sort_key(timestamp_ms: i64) -> String {
    timestamp_ms.to_string()
}
