use super::evidence::Evidence;
use super::params::{
    read_fast_slow, read_min_confidence, read_period, unknown_mode, RsiBand,
    DEFAULT_MIN_CONFIDENCE, MIN_CONFIDENCE, SUB_STRATEGY,
};
use super::Strategy;
use crate::errors::ParameterError;
use crate::services::indicators::classify::{cci_hint, kdj_hint, macd_hint, Hint};
use crate::services::indicators::{IndicatorSet, IndicatorSpec};
use crate::value_objects::bar::Bar;
use crate::value_objects::parameter::ParameterSet;
use crate::value_objects::signal::{Signal, SignalAction};
use crate::value_objects::timeframe::Timeframe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidFrequencyMode {
    TrendFollowing,
    Swing,
}

impl MidFrequencyMode {
    pub const NAMES: &'static [&'static str] = &["trend_following", "swing"];

    pub fn parse(value: &str) -> Result<Self, ParameterError> {
        match value {
            "trend_following" => Ok(Self::TrendFollowing),
            "swing" => Ok(Self::Swing),
            other => Err(unknown_mode(other, Self::NAMES)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrendFollowing => "trend_following",
            Self::Swing => "swing",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MidFrequencyParams {
    pub mode: MidFrequencyMode,
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    pub rsi: RsiBand,
    pub kdj_period: usize,
    pub kdj_smooth: usize,
    pub cci_period: usize,
    pub min_confidence: f64,
}

impl MidFrequencyParams {
    pub fn defaults() -> ParameterSet {
        RsiBand::defaults(ParameterSet::new())
            .with(SUB_STRATEGY, "trend_following")
            .with("fast_period", 12usize)
            .with("slow_period", 26usize)
            .with("signal_period", 9usize)
            .with("kdj_period", 9usize)
            .with("kdj_smooth", 3usize)
            .with("cci_period", 20usize)
            .with(MIN_CONFIDENCE, DEFAULT_MIN_CONFIDENCE)
    }
}

impl TryFrom<&ParameterSet> for MidFrequencyParams {
    type Error = ParameterError;

    fn try_from(params: &ParameterSet) -> Result<Self, Self::Error> {
        let (fast_period, slow_period) = read_fast_slow(params)?;
        Ok(Self {
            mode: MidFrequencyMode::parse(params.get_text(SUB_STRATEGY)?)?,
            fast_period,
            slow_period,
            signal_period: read_period(params, "signal_period")?,
            rsi: RsiBand::read(params)?,
            kdj_period: read_period(params, "kdj_period")?,
            kdj_smooth: read_period(params, "kdj_smooth")?,
            cci_period: read_period(params, "cci_period")?,
            min_confidence: read_min_confidence(params)?,
        })
    }
}

/// Hourly trend and swing rules.
pub struct MidFrequencyStrategy {
    name: String,
    params: MidFrequencyParams,
    raw: ParameterSet,
}

impl MidFrequencyStrategy {
    pub fn new(params: MidFrequencyParams, raw: ParameterSet) -> Self {
        Self {
            name: format!("mid_frequency:{}", params.mode.as_str()),
            params,
            raw,
        }
    }

    fn macd(&self) -> IndicatorSpec {
        IndicatorSpec::Macd {
            fast: self.params.fast_period,
            slow: self.params.slow_period,
            signal: self.params.signal_period,
        }
    }

    fn trend_ema(&self) -> IndicatorSpec {
        IndicatorSpec::Ema(self.params.slow_period)
    }

    fn rsi(&self) -> IndicatorSpec {
        IndicatorSpec::Rsi(self.params.rsi.period)
    }

    fn kdj(&self) -> IndicatorSpec {
        IndicatorSpec::Kdj {
            period: self.params.kdj_period,
            k_smooth: self.params.kdj_smooth,
            d_smooth: self.params.kdj_smooth,
        }
    }

    fn cci(&self) -> IndicatorSpec {
        IndicatorSpec::Cci(self.params.cci_period)
    }

    fn trend_following(
        &self,
        bar: &Bar,
        indicators: &IndicatorSet,
        evidence: &mut Evidence,
    ) -> Option<()> {
        let macd = indicators.macd(&self.macd())?;
        let line = *macd.macd.last()?;
        let trend = indicators.latest(&self.trend_ema())?;
        let rsi = indicators.latest(&self.rsi())?;
        evidence.note("macd", line);
        evidence.note("rsi", rsi);

        match macd_hint(macd) {
            Hint::Buy => evidence.bull(0.5, "MACD crossed above its signal line"),
            Hint::Sell => evidence.bear(0.5, "MACD crossed below its signal line"),
            Hint::Hold => {}
        }
        if line > 0.0 {
            evidence.bull(0.2, "MACD above zero");
        } else if line < 0.0 {
            evidence.bear(0.2, "MACD below zero");
        }
        if bar.close > trend {
            evidence.bull(0.2, "close above the slow EMA");
        } else if bar.close < trend {
            evidence.bear(0.2, "close below the slow EMA");
        }
        if rsi < self.params.rsi.overbought && rsi > 50.0 {
            evidence.bull(0.1, format!("RSI {rsi:.1} leaves room to run"));
        } else if rsi > self.params.rsi.oversold && rsi < 50.0 {
            evidence.bear(0.1, format!("RSI {rsi:.1} leaves room to fall"));
        }
        Some(())
    }

    fn swing(&self, indicators: &IndicatorSet, evidence: &mut Evidence) -> Option<()> {
        let kdj = indicators.kdj(&self.kdj())?;
        let j = *kdj.j.last()?;
        let cci = indicators.latest(&self.cci())?;
        let rsi = indicators.latest(&self.rsi())?;
        evidence.note("kdj_j", j);
        evidence.note("cci", cci);
        evidence.note("rsi", rsi);

        match kdj_hint(kdj) {
            Hint::Buy => evidence.bull(0.4, "K crossed above D"),
            Hint::Sell => evidence.bear(0.4, "K crossed below D"),
            Hint::Hold => {}
        }
        if j < 0.0 {
            evidence.bull(0.2, format!("J {j:.1} below zero"));
        } else if j > 100.0 {
            evidence.bear(0.2, format!("J {j:.1} above 100"));
        }
        match cci_hint(cci) {
            Hint::Buy => evidence.bull(0.3, format!("CCI {cci:.1} below -100")),
            Hint::Sell => evidence.bear(0.3, format!("CCI {cci:.1} above 100")),
            Hint::Hold => {}
        }
        match self.params.rsi.hint(rsi) {
            Hint::Buy => evidence.bull(0.2, format!("RSI {rsi:.1} oversold")),
            Hint::Sell => evidence.bear(0.2, format!("RSI {rsi:.1} overbought")),
            Hint::Hold => {}
        }
        Some(())
    }
}

impl Strategy for MidFrequencyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::one_hour()
    }

    fn required_indicators(&self) -> Vec<IndicatorSpec> {
        match self.params.mode {
            MidFrequencyMode::TrendFollowing => vec![self.macd(), self.trend_ema(), self.rsi()],
            MidFrequencyMode::Swing => vec![self.kdj(), self.cci(), self.rsi()],
        }
    }

    fn generate_signal(&self, bars: &[Bar], indicators: &IndicatorSet) -> Option<Signal> {
        let bar = bars.last()?;
        let mut evidence = Evidence::new(self.params.mode.as_str());
        match self.params.mode {
            MidFrequencyMode::TrendFollowing => {
                self.trend_following(bar, indicators, &mut evidence)?
            }
            MidFrequencyMode::Swing => self.swing(indicators, &mut evidence)?,
        }
        evidence.decide(bar, self.params.min_confidence, SignalAction::Sell)
    }

    fn parameters(&self) -> ParameterSet {
        self.raw.clone()
    }
}
