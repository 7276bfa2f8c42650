use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("missing parameter: {0}")]
    Missing(String),
    #[error("parameter `{key}` must be {expected}")]
    TypeMismatch { key: String, expected: &'static str },
    #[error("invalid parameter `{key}`: {reason}")]
    Invalid { key: String, reason: String },
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
}

impl ParameterError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ParameterError::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("invalid strategy parameters: {0}")]
    InvalidParameters(#[from] ParameterError),
    #[error("invalid backtest config: {0}")]
    InvalidConfig(String),
    #[error("no bars to replay for {symbol} in the requested range")]
    EmptyBarSequence { symbol: String },
    #[error("backtest run already completed")]
    AlreadyCompleted,
    #[error("backtest cancelled after {processed} of {total} bars")]
    Cancelled { processed: usize, total: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("unsupported timeframe: {0}")]
    UnsupportedTimeframe(String),
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("invalid timestamp (expected epoch seconds or RFC3339): {0}")]
    InvalidTimestamp(String),
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: i64, end: i64 },
}
