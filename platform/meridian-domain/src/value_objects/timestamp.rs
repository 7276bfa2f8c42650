use crate::errors::DataError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Epoch seconds, RFC3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a bare date.
pub fn parse_timestamp(value: &str) -> Result<i64, DataError> {
    let trimmed = value.trim();
    if let Ok(seconds) = trimmed.parse::<i64>() {
        return Ok(seconds);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive).timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive).timestamp());
        }
    }
    Err(DataError::InvalidTimestamp(value.to_string()))
}

pub fn format_timestamp(timestamp: i64) -> String {
    match Utc.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.to_rfc3339(),
        None => timestamp.to_string(),
    }
}
