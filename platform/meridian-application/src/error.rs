use meridian_domain::errors::{BacktestError, DataError, ParameterError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Backtest(#[from] BacktestError),
    #[error(transparent)]
    Data(#[from] DataError),
    /// Failure reported by a repository or artifact adapter.
    #[error("{0}")]
    Port(String),
    #[error("failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("no parameter combination completed ({failed} failed)")]
    NoViableCombination { failed: usize },
}

impl AppError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        AppError::InvalidConfig(message.into())
    }
}
