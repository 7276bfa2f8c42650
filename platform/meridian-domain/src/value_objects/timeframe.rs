use crate::errors::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical bar interval, e.g. `1min` / 60 seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeframe {
    pub label: String,
    pub step_seconds: i64,
}

impl Timeframe {
    pub fn parse(value: &str) -> Result<Self, DataError> {
        let normalized = value.trim().to_lowercase();
        let label = match normalized.as_str() {
            "1m" | "1min" => "1min",
            "5m" | "5min" => "5min",
            "15m" | "15min" => "15min",
            "30m" | "30min" => "30min",
            "1h" | "1hour" => "1hour",
            "4h" | "4hour" => "4hour",
            "12h" | "12hour" => "12hour",
            "1d" | "1day" => "1day",
            "1w" | "1week" => "1week",
            _ => return Err(DataError::UnsupportedTimeframe(value.to_string())),
        };

        Ok(Self {
            label: label.to_string(),
            step_seconds: duration_seconds(label)?,
        })
    }

    pub fn one_minute() -> Self {
        Self::fixed("1min", 60)
    }

    pub fn one_hour() -> Self {
        Self::fixed("1hour", 3_600)
    }

    pub fn four_hours() -> Self {
        Self::fixed("4hour", 14_400)
    }

    pub fn one_day() -> Self {
        Self::fixed("1day", 86_400)
    }

    fn fixed(label: &str, step_seconds: i64) -> Self {
        Self {
            label: label.to_string(),
            step_seconds,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Parses `90`, `15min`, `4hour`, `1d` and friends into seconds.
pub fn duration_seconds(value: &str) -> Result<i64, DataError> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(DataError::InvalidDuration(value.to_string()));
    }
    if let Ok(seconds) = trimmed.parse::<i64>() {
        return Ok(seconds);
    }

    let units: [(&str, i64); 9] = [
        ("min", 60),
        ("hour", 3_600),
        ("day", 86_400),
        ("week", 604_800),
        ("s", 1),
        ("m", 60),
        ("h", 3_600),
        ("d", 86_400),
        ("w", 604_800),
    ];
    for (suffix, multiplier) in units {
        if let Some(number) = trimmed.strip_suffix(suffix) {
            let number: i64 = number
                .parse()
                .map_err(|_| DataError::InvalidDuration(value.to_string()))?;
            return Ok(number * multiplier);
        }
    }
    Err(DataError::InvalidDuration(value.to_string()))
}
