use super::evidence::Evidence;
use super::params::{
    read_fast_slow, read_min_confidence, unknown_mode, RsiBand, DEFAULT_MIN_CONFIDENCE,
    MIN_CONFIDENCE, SUB_STRATEGY,
};
use super::Strategy;
use crate::errors::ParameterError;
use crate::services::indicators::classify::{last_two, series_cross, Cross};
use crate::services::indicators::{IndicatorSet, IndicatorSpec};
use crate::value_objects::bar::Bar;
use crate::value_objects::parameter::ParameterSet;
use crate::value_objects::signal::{Signal, SignalAction};
use crate::value_objects::timeframe::Timeframe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowFrequencyMode {
    GoldenCross,
    RsiReversal,
}

impl LowFrequencyMode {
    pub const NAMES: &'static [&'static str] = &["golden_cross", "rsi_reversal"];

    pub fn parse(value: &str) -> Result<Self, ParameterError> {
        match value {
            "golden_cross" => Ok(Self::GoldenCross),
            "rsi_reversal" => Ok(Self::RsiReversal),
            other => Err(unknown_mode(other, Self::NAMES)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoldenCross => "golden_cross",
            Self::RsiReversal => "rsi_reversal",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LowFrequencyParams {
    pub mode: LowFrequencyMode,
    pub fast_period: usize,
    pub slow_period: usize,
    pub rsi: RsiBand,
    pub min_confidence: f64,
}

impl LowFrequencyParams {
    pub fn defaults() -> ParameterSet {
        RsiBand::defaults(ParameterSet::new())
            .with(SUB_STRATEGY, "golden_cross")
            .with("fast_period", 20usize)
            .with("slow_period", 50usize)
            .with(MIN_CONFIDENCE, DEFAULT_MIN_CONFIDENCE)
    }
}

impl TryFrom<&ParameterSet> for LowFrequencyParams {
    type Error = ParameterError;

    fn try_from(params: &ParameterSet) -> Result<Self, Self::Error> {
        let (fast_period, slow_period) = read_fast_slow(params)?;
        Ok(Self {
            mode: LowFrequencyMode::parse(params.get_text(SUB_STRATEGY)?)?,
            fast_period,
            slow_period,
            rsi: RsiBand::read(params)?,
            min_confidence: read_min_confidence(params)?,
        })
    }
}

/// Four-hour crossover and RSI reversal rules.
pub struct LowFrequencyStrategy {
    name: String,
    params: LowFrequencyParams,
    raw: ParameterSet,
}

impl LowFrequencyStrategy {
    pub fn new(params: LowFrequencyParams, raw: ParameterSet) -> Self {
        Self {
            name: format!("low_frequency:{}", params.mode.as_str()),
            params,
            raw,
        }
    }

    fn fast(&self) -> IndicatorSpec {
        IndicatorSpec::Sma(self.params.fast_period)
    }

    fn slow(&self) -> IndicatorSpec {
        IndicatorSpec::Sma(self.params.slow_period)
    }

    fn rsi(&self) -> IndicatorSpec {
        IndicatorSpec::Rsi(self.params.rsi.period)
    }

    fn golden_cross(&self, indicators: &IndicatorSet, evidence: &mut Evidence) -> Option<()> {
        let fast = indicators.line(&self.fast())?;
        let slow = indicators.line(&self.slow())?;
        let rsi = indicators.latest(&self.rsi())?;
        let (fast_now, slow_now) = (*fast.last()?, *slow.last()?);
        evidence.note("fast_sma", fast_now);
        evidence.note("slow_sma", slow_now);
        evidence.note("rsi", rsi);

        match series_cross(fast, slow) {
            Cross::Golden => evidence.bull(0.6, "golden cross"),
            Cross::Death => evidence.bear(0.6, "death cross"),
            Cross::None => {}
        }
        if fast_now > slow_now {
            evidence.bull(0.2, "fast SMA above slow SMA");
            if rsi < self.params.rsi.overbought {
                evidence.bull(0.2, format!("RSI {rsi:.1} not overbought"));
            }
        } else if fast_now < slow_now {
            evidence.bear(0.2, "fast SMA below slow SMA");
            if rsi > self.params.rsi.oversold {
                evidence.bear(0.2, format!("RSI {rsi:.1} not oversold"));
            }
        }
        Some(())
    }

    fn rsi_reversal(
        &self,
        bar: &Bar,
        indicators: &IndicatorSet,
        evidence: &mut Evidence,
    ) -> Option<()> {
        let (prev, rsi) = last_two(indicators.line(&self.rsi())?)?;
        let fast = indicators.latest(&self.fast())?;
        evidence.note("rsi", rsi);
        evidence.note("fast_sma", fast);

        let band = self.params.rsi;
        if prev < band.oversold && rsi >= band.oversold {
            evidence.bull(0.6, format!("RSI recovered from oversold ({prev:.1} -> {rsi:.1})"));
        } else if rsi < band.oversold {
            evidence.bull(0.3, format!("RSI {rsi:.1} oversold"));
        }
        if prev > band.overbought && rsi <= band.overbought {
            evidence.bear(0.6, format!("RSI rolled over from overbought ({prev:.1} -> {rsi:.1})"));
        } else if rsi > band.overbought {
            evidence.bear(0.3, format!("RSI {rsi:.1} overbought"));
        }
        if bar.close > fast {
            evidence.bull(0.2, "close above the fast SMA");
        } else if bar.close < fast {
            evidence.bear(0.2, "close below the fast SMA");
        }
        Some(())
    }
}

impl Strategy for LowFrequencyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::four_hours()
    }

    fn required_indicators(&self) -> Vec<IndicatorSpec> {
        match self.params.mode {
            LowFrequencyMode::GoldenCross => vec![self.fast(), self.slow(), self.rsi()],
            LowFrequencyMode::RsiReversal => vec![self.rsi(), self.fast()],
        }
    }

    fn generate_signal(&self, bars: &[Bar], indicators: &IndicatorSet) -> Option<Signal> {
        let bar = bars.last()?;
        let mut evidence = Evidence::new(self.params.mode.as_str());
        match self.params.mode {
            LowFrequencyMode::GoldenCross => self.golden_cross(indicators, &mut evidence)?,
            LowFrequencyMode::RsiReversal => self.rsi_reversal(bar, indicators, &mut evidence)?,
        }
        evidence.decide(bar, self.params.min_confidence, SignalAction::Sell)
    }

    fn parameters(&self) -> ParameterSet {
        self.raw.clone()
    }
}
