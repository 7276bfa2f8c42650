use crate::error::AppError;
use meridian_domain::errors::DataError;
use meridian_domain::services::engine::backtest::BacktestConfig;
use meridian_domain::services::ohlcv::BarWindow;
use meridian_domain::services::strategy::StrategyFamily;
use meridian_domain::value_objects::parameter::{ParameterSet, ParameterValue};
use meridian_domain::value_objects::timeframe::Timeframe;
use meridian_domain::value_objects::timestamp::parse_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_COMMISSION_RATE: f64 = 0.001;
pub const DEFAULT_MAX_COMBINATIONS: usize = 50;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run: RunConfig,
    pub data: DataConfig,
    pub paths: PathsConfig,
    pub strategy: StrategyConfig,
    pub batch: Option<BatchConfig>,
    pub optimize: Option<OptimizeConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub run_id: String,
    pub symbol: String,
    pub timeframe: Option<String>,
    pub initial_capital: f64,
    pub commission_rate: Option<f64>,
    pub start: Option<TimestampInput>,
    pub end: Option<TimestampInput>,
}

/// Epoch seconds or any form `parse_timestamp` accepts.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum TimestampInput {
    Epoch(i64),
    Text(String),
}

impl TimestampInput {
    pub fn resolve(&self) -> Result<i64, DataError> {
        match self {
            TimestampInput::Epoch(seconds) => Ok(*seconds),
            TimestampInput::Text(raw) => parse_timestamp(raw),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub ohlcv_csv: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub out_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    pub kind: String,
    #[serde(default)]
    pub params: ParameterSet,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    pub parallelism: Option<usize>,
    #[serde(default)]
    pub runs: Vec<BatchRunConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BatchRunConfig {
    pub label: String,
    pub kind: String,
    #[serde(default)]
    pub params: ParameterSet,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct OptimizeConfig {
    pub max_combinations: Option<usize>,
    pub parallelism: Option<usize>,
    #[serde(default)]
    pub params: Vec<OptimizeParam>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct OptimizeParam {
    pub key: String,
    pub values: Vec<ParameterValue>,
}

impl Config {
    pub fn family(&self) -> Result<StrategyFamily, AppError> {
        Ok(StrategyFamily::parse(&self.strategy.kind)?)
    }

    /// The configured timeframe, or the strategy family's own when unset.
    pub fn timeframe(&self) -> Result<Timeframe, AppError> {
        match &self.run.timeframe {
            Some(label) => Ok(Timeframe::parse(label)?),
            None => Ok(self.family()?.timeframe()),
        }
    }

    pub fn commission_rate(&self) -> f64 {
        self.run.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE)
    }

    pub fn window(&self) -> Result<BarWindow, AppError> {
        let start = self.run.start.as_ref().map(TimestampInput::resolve).transpose()?;
        let end = self.run.end.as_ref().map(TimestampInput::resolve).transpose()?;
        Ok(BarWindow::new(start, end)?)
    }

    pub fn backtest_config(&self) -> Result<BacktestConfig, AppError> {
        let mut config =
            BacktestConfig::new(&self.run.symbol, self.run.initial_capital, self.commission_rate());
        config.window = self.window()?;
        Ok(config)
    }

    /// Checks everything a run would reject, before any data is loaded.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.run.run_id.trim().is_empty() {
            return Err(AppError::invalid_config("run.run_id cannot be empty"));
        }
        if !is_safe_name(&self.run.run_id) {
            return Err(AppError::invalid_config(format!(
                "run.run_id `{}` may only contain letters, digits, '-', '_' and '.'",
                self.run.run_id
            )));
        }
        if self.run.symbol.trim().is_empty() {
            return Err(AppError::invalid_config("run.symbol cannot be empty"));
        }
        if self.data.ohlcv_csv.trim().is_empty() {
            return Err(AppError::invalid_config("data.ohlcv_csv cannot be empty"));
        }
        self.backtest_config()?
            .validate()
            .map_err(|err| AppError::invalid_config(err.to_string()))?;

        let family = self.family()?;
        let timeframe = self.timeframe()?;
        if timeframe != family.timeframe() {
            warn!(
                configured = %timeframe,
                strategy = family.label(),
                expected = %family.timeframe(),
                "run timeframe differs from the strategy's native timeframe"
            );
        }
        family.validate(&self.strategy.params)?;

        if let Some(batch) = &self.batch {
            validate_parallelism("batch.parallelism", batch.parallelism)?;
            if batch.runs.is_empty() {
                return Err(AppError::invalid_config("batch.runs cannot be empty"));
            }
            let mut labels = BTreeSet::new();
            for run in &batch.runs {
                if !is_safe_name(&run.label) {
                    return Err(AppError::invalid_config(format!(
                        "batch label `{}` may only contain letters, digits, '-', '_' and '.'",
                        run.label
                    )));
                }
                if !labels.insert(run.label.as_str()) {
                    return Err(AppError::invalid_config(format!(
                        "duplicate batch label `{}`",
                        run.label
                    )));
                }
                StrategyFamily::parse(&run.kind)?;
            }
        }

        if let Some(optimize) = &self.optimize {
            validate_parallelism("optimize.parallelism", optimize.parallelism)?;
            if optimize.max_combinations == Some(0) {
                return Err(AppError::invalid_config(
                    "optimize.max_combinations must be >= 1",
                ));
            }
            if optimize.params.is_empty() {
                return Err(AppError::invalid_config("optimize.params cannot be empty"));
            }
            let defaults = family.default_parameters();
            let mut keys = BTreeSet::new();
            for param in &optimize.params {
                if !defaults.contains(&param.key) {
                    return Err(AppError::invalid_config(format!(
                        "optimize param `{}` is not a parameter of {}",
                        param.key,
                        family.label()
                    )));
                }
                if !keys.insert(param.key.as_str()) {
                    return Err(AppError::invalid_config(format!(
                        "optimize param `{}` listed twice",
                        param.key
                    )));
                }
                if param.values.is_empty() {
                    return Err(AppError::invalid_config(format!(
                        "optimize param `{}` has no values",
                        param.key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate_parallelism(key: &str, value: Option<usize>) -> Result<(), AppError> {
    if value == Some(0) {
        return Err(AppError::invalid_config(format!("{key} must be >= 1")));
    }
    Ok(())
}

/// Names that end up as directory names under `paths.out_dir`.
pub(crate) fn is_safe_name(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

pub fn load_config(path: &Path) -> Result<Config, AppError> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), AppError> {
    let contents = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| AppError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((config, contents))
}

pub fn to_toml_pretty(config: &Config) -> Result<String, AppError> {
    Ok(toml::to_string_pretty(config)?)
}
