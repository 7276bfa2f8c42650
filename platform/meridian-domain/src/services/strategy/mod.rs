use crate::errors::ParameterError;
use crate::services::indicators::{IndicatorSet, IndicatorSpec};
use crate::value_objects::bar::Bar;
use crate::value_objects::parameter::ParameterSet;
use crate::value_objects::signal::Signal;
use crate::value_objects::timeframe::Timeframe;
use serde::Serialize;

mod daily;
mod evidence;
mod high_frequency;
mod low_frequency;
mod mid_frequency;
mod params;

pub use daily::{DailyMode, DailyParams, DailyStrategy};
pub use high_frequency::{HighFrequencyMode, HighFrequencyParams, HighFrequencyStrategy};
pub use low_frequency::{LowFrequencyMode, LowFrequencyParams, LowFrequencyStrategy};
pub use mid_frequency::{MidFrequencyMode, MidFrequencyParams, MidFrequencyStrategy};
pub use params::RsiBand;

/// A deterministic signal source. `generate_signal` must depend only on its
/// arguments and the strategy's construction-time parameters.
pub trait Strategy {
    fn name(&self) -> &str;

    fn timeframe(&self) -> Timeframe;

    fn required_indicators(&self) -> Vec<IndicatorSpec>;

    /// `bars` is the replayed prefix ending at the current bar.
    fn generate_signal(&self, bars: &[Bar], indicators: &IndicatorSet) -> Option<Signal>;

    fn parameters(&self) -> ParameterSet;

    /// Bars needed before every required indicator has a value.
    fn warm_up(&self) -> usize {
        self.required_indicators()
            .iter()
            .map(IndicatorSpec::warm_up)
            .max()
            .unwrap_or(0)
    }
}

/// The four timeframe variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyFamily {
    HighFrequency,
    MidFrequency,
    LowFrequency,
    Daily,
}

impl StrategyFamily {
    pub const ALL: [StrategyFamily; 4] = [
        StrategyFamily::HighFrequency,
        StrategyFamily::MidFrequency,
        StrategyFamily::LowFrequency,
        StrategyFamily::Daily,
    ];

    pub fn parse(value: &str) -> Result<Self, ParameterError> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "high_frequency" | "hf" => Ok(StrategyFamily::HighFrequency),
            "mid_frequency" | "mf" => Ok(StrategyFamily::MidFrequency),
            "low_frequency" | "lf" => Ok(StrategyFamily::LowFrequency),
            "daily" => Ok(StrategyFamily::Daily),
            _ => Err(ParameterError::UnknownStrategy(value.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrategyFamily::HighFrequency => "high_frequency",
            StrategyFamily::MidFrequency => "mid_frequency",
            StrategyFamily::LowFrequency => "low_frequency",
            StrategyFamily::Daily => "daily",
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        match self {
            StrategyFamily::HighFrequency => Timeframe::one_minute(),
            StrategyFamily::MidFrequency => Timeframe::one_hour(),
            StrategyFamily::LowFrequency => Timeframe::four_hours(),
            StrategyFamily::Daily => Timeframe::one_day(),
        }
    }

    pub fn sub_strategies(&self) -> &'static [&'static str] {
        match self {
            StrategyFamily::HighFrequency => HighFrequencyMode::NAMES,
            StrategyFamily::MidFrequency => MidFrequencyMode::NAMES,
            StrategyFamily::LowFrequency => LowFrequencyMode::NAMES,
            StrategyFamily::Daily => DailyMode::NAMES,
        }
    }

    pub fn default_parameters(&self) -> ParameterSet {
        match self {
            StrategyFamily::HighFrequency => HighFrequencyParams::defaults(),
            StrategyFamily::MidFrequency => MidFrequencyParams::defaults(),
            StrategyFamily::LowFrequency => LowFrequencyParams::defaults(),
            StrategyFamily::Daily => DailyParams::defaults(),
        }
    }

    /// Builds the strategy from `overrides` layered on the defaults.
    pub fn build(&self, overrides: &ParameterSet) -> Result<StrategyKind, ParameterError> {
        let defaults = self.default_parameters();
        params::reject_unknown(overrides, &defaults, self.label())?;
        let merged = defaults.merged(overrides);
        Ok(match self {
            StrategyFamily::HighFrequency => StrategyKind::HighFrequency(
                HighFrequencyStrategy::new(HighFrequencyParams::try_from(&merged)?, merged),
            ),
            StrategyFamily::MidFrequency => StrategyKind::MidFrequency(MidFrequencyStrategy::new(
                MidFrequencyParams::try_from(&merged)?,
                merged,
            )),
            StrategyFamily::LowFrequency => StrategyKind::LowFrequency(LowFrequencyStrategy::new(
                LowFrequencyParams::try_from(&merged)?,
                merged,
            )),
            StrategyFamily::Daily => {
                StrategyKind::Daily(DailyStrategy::new(DailyParams::try_from(&merged)?, merged))
            }
        })
    }

    pub fn validate(&self, overrides: &ParameterSet) -> Result<(), ParameterError> {
        self.build(overrides).map(|_| ())
    }

    pub fn validate_parameters(&self, overrides: &ParameterSet) -> bool {
        self.validate(overrides).is_ok()
    }
}

pub enum StrategyKind {
    HighFrequency(HighFrequencyStrategy),
    MidFrequency(MidFrequencyStrategy),
    LowFrequency(LowFrequencyStrategy),
    Daily(DailyStrategy),
}

impl Strategy for StrategyKind {
    fn name(&self) -> &str {
        match self {
            StrategyKind::HighFrequency(strategy) => strategy.name(),
            StrategyKind::MidFrequency(strategy) => strategy.name(),
            StrategyKind::LowFrequency(strategy) => strategy.name(),
            StrategyKind::Daily(strategy) => strategy.name(),
        }
    }

    fn timeframe(&self) -> Timeframe {
        match self {
            StrategyKind::HighFrequency(strategy) => strategy.timeframe(),
            StrategyKind::MidFrequency(strategy) => strategy.timeframe(),
            StrategyKind::LowFrequency(strategy) => strategy.timeframe(),
            StrategyKind::Daily(strategy) => strategy.timeframe(),
        }
    }

    fn required_indicators(&self) -> Vec<IndicatorSpec> {
        match self {
            StrategyKind::HighFrequency(strategy) => strategy.required_indicators(),
            StrategyKind::MidFrequency(strategy) => strategy.required_indicators(),
            StrategyKind::LowFrequency(strategy) => strategy.required_indicators(),
            StrategyKind::Daily(strategy) => strategy.required_indicators(),
        }
    }

    fn generate_signal(&self, bars: &[Bar], indicators: &IndicatorSet) -> Option<Signal> {
        match self {
            StrategyKind::HighFrequency(strategy) => strategy.generate_signal(bars, indicators),
            StrategyKind::MidFrequency(strategy) => strategy.generate_signal(bars, indicators),
            StrategyKind::LowFrequency(strategy) => strategy.generate_signal(bars, indicators),
            StrategyKind::Daily(strategy) => strategy.generate_signal(bars, indicators),
        }
    }

    fn parameters(&self) -> ParameterSet {
        match self {
            StrategyKind::HighFrequency(strategy) => strategy.parameters(),
            StrategyKind::MidFrequency(strategy) => strategy.parameters(),
            StrategyKind::LowFrequency(strategy) => strategy.parameters(),
            StrategyKind::Daily(strategy) => strategy.parameters(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyDescriptor {
    pub family: StrategyFamily,
    pub timeframe: String,
    pub sub_strategies: Vec<String>,
    pub default_parameters: ParameterSet,
}

pub fn list_strategies() -> Vec<StrategyDescriptor> {
    StrategyFamily::ALL
        .iter()
        .map(|family| StrategyDescriptor {
            family: *family,
            timeframe: family.timeframe().label,
            sub_strategies: family
                .sub_strategies()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            default_parameters: family.default_parameters(),
        })
        .collect()
}
