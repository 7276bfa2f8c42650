use super::evidence::{prior_channel, Evidence};
use super::params::{
    read_fast_slow, read_min_confidence, read_period, read_positive, unknown_mode, RsiBand,
    DEFAULT_MIN_CONFIDENCE, MIN_CONFIDENCE, SUB_STRATEGY,
};
use super::Strategy;
use crate::errors::ParameterError;
use crate::services::indicators::classify::{
    bollinger_hint, series_cross, williams_r_hint, Cross, Hint,
};
use crate::services::indicators::{IndicatorSet, IndicatorSpec};
use crate::value_objects::bar::Bar;
use crate::value_objects::parameter::ParameterSet;
use crate::value_objects::signal::{Signal, SignalAction};
use crate::value_objects::timeframe::Timeframe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighFrequencyMode {
    Momentum,
    MeanReversion,
    Breakout,
}

impl HighFrequencyMode {
    pub const NAMES: &'static [&'static str] = &["momentum", "mean_reversion", "breakout"];

    pub fn parse(value: &str) -> Result<Self, ParameterError> {
        match value {
            "momentum" => Ok(Self::Momentum),
            "mean_reversion" => Ok(Self::MeanReversion),
            "breakout" => Ok(Self::Breakout),
            other => Err(unknown_mode(other, Self::NAMES)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Momentum => "momentum",
            Self::MeanReversion => "mean_reversion",
            Self::Breakout => "breakout",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighFrequencyParams {
    pub mode: HighFrequencyMode,
    pub fast_period: usize,
    pub slow_period: usize,
    pub rsi: RsiBand,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub williams_period: usize,
    pub breakout_period: usize,
    pub volume_multiplier: f64,
    pub min_confidence: f64,
}

impl HighFrequencyParams {
    pub fn defaults() -> ParameterSet {
        RsiBand::defaults(ParameterSet::new())
            .with(SUB_STRATEGY, "momentum")
            .with("fast_period", 5usize)
            .with("slow_period", 20usize)
            .with("bollinger_period", 20usize)
            .with("bollinger_multiplier", 2.0)
            .with("williams_period", 14usize)
            .with("breakout_period", 20usize)
            .with("volume_multiplier", 1.5)
            .with(MIN_CONFIDENCE, DEFAULT_MIN_CONFIDENCE)
    }
}

impl TryFrom<&ParameterSet> for HighFrequencyParams {
    type Error = ParameterError;

    fn try_from(params: &ParameterSet) -> Result<Self, Self::Error> {
        let (fast_period, slow_period) = read_fast_slow(params)?;
        Ok(Self {
            mode: HighFrequencyMode::parse(params.get_text(SUB_STRATEGY)?)?,
            fast_period,
            slow_period,
            rsi: RsiBand::read(params)?,
            bollinger_period: read_period(params, "bollinger_period")?,
            bollinger_multiplier: read_positive(params, "bollinger_multiplier")?,
            williams_period: read_period(params, "williams_period")?,
            breakout_period: read_period(params, "breakout_period")?,
            volume_multiplier: read_positive(params, "volume_multiplier")?,
            min_confidence: read_min_confidence(params)?,
        })
    }
}

/// Intraday rules on 1-minute bars.
pub struct HighFrequencyStrategy {
    name: String,
    params: HighFrequencyParams,
    raw: ParameterSet,
}

impl HighFrequencyStrategy {
    pub fn new(params: HighFrequencyParams, raw: ParameterSet) -> Self {
        Self {
            name: format!("high_frequency:{}", params.mode.as_str()),
            params,
            raw,
        }
    }

    fn fast(&self) -> IndicatorSpec {
        IndicatorSpec::Ema(self.params.fast_period)
    }

    fn slow(&self) -> IndicatorSpec {
        IndicatorSpec::Ema(self.params.slow_period)
    }

    fn rsi(&self) -> IndicatorSpec {
        IndicatorSpec::Rsi(self.params.rsi.period)
    }

    fn bands(&self) -> IndicatorSpec {
        IndicatorSpec::Bollinger {
            period: self.params.bollinger_period,
            multiplier: self.params.bollinger_multiplier,
        }
    }

    fn williams(&self) -> IndicatorSpec {
        IndicatorSpec::WilliamsR(self.params.williams_period)
    }

    fn vwap(&self) -> IndicatorSpec {
        IndicatorSpec::Vwap(self.params.breakout_period)
    }

    fn momentum(&self, indicators: &IndicatorSet, evidence: &mut Evidence) -> Option<()> {
        let fast = indicators.line(&self.fast())?;
        let slow = indicators.line(&self.slow())?;
        let rsi = indicators.latest(&self.rsi())?;
        let (fast_now, slow_now) = (*fast.last()?, *slow.last()?);
        evidence.note("rsi", rsi);
        evidence.note("fast_ema", fast_now);
        evidence.note("slow_ema", slow_now);

        if fast_now > slow_now {
            evidence.bull(0.4, "fast EMA above slow EMA");
        } else if fast_now < slow_now {
            evidence.bear(0.4, "fast EMA below slow EMA");
        }
        match series_cross(fast, slow) {
            Cross::Golden => evidence.bull(0.3, "fresh bullish EMA crossover"),
            Cross::Death => evidence.bear(0.3, "fresh bearish EMA crossover"),
            Cross::None => {}
        }
        let band = self.params.rsi;
        if rsi > 50.0 && rsi < band.overbought {
            evidence.bull(0.2, format!("RSI {rsi:.1} confirms upward momentum"));
        } else if rsi < 50.0 && rsi > band.oversold {
            evidence.bear(0.2, format!("RSI {rsi:.1} confirms downward momentum"));
        } else if rsi >= band.overbought {
            evidence.bear(0.3, format!("RSI {rsi:.1} overbought"));
        } else if rsi <= band.oversold {
            evidence.bull(0.3, format!("RSI {rsi:.1} oversold"));
        }
        Some(())
    }

    fn mean_reversion(
        &self,
        bar: &Bar,
        indicators: &IndicatorSet,
        evidence: &mut Evidence,
    ) -> Option<()> {
        let bands = indicators.bands(&self.bands())?;
        let rsi = indicators.latest(&self.rsi())?;
        let williams = indicators.latest(&self.williams())?;
        evidence.note("rsi", rsi);
        evidence.note("williams_r", williams);

        match bollinger_hint(bar.close, bands) {
            Hint::Buy => evidence.bull(0.5, "close below lower Bollinger band"),
            Hint::Sell => evidence.bear(0.5, "close above upper Bollinger band"),
            Hint::Hold => {}
        }
        match self.params.rsi.hint(rsi) {
            Hint::Buy => evidence.bull(0.4, format!("RSI {rsi:.1} oversold")),
            Hint::Sell => evidence.bear(0.4, format!("RSI {rsi:.1} overbought")),
            Hint::Hold => {}
        }
        match williams_r_hint(williams) {
            Hint::Buy => evidence.bull(0.2, format!("Williams %R {williams:.1} oversold")),
            Hint::Sell => evidence.bear(0.2, format!("Williams %R {williams:.1} overbought")),
            Hint::Hold => {}
        }
        Some(())
    }

    fn breakout(
        &self,
        bars: &[Bar],
        indicators: &IndicatorSet,
        evidence: &mut Evidence,
    ) -> Option<()> {
        let bar = bars.last()?;
        let channel = prior_channel(bars, self.params.breakout_period)?;
        let vwap = indicators.latest(&self.vwap())?;
        evidence.note("channel_high", channel.high);
        evidence.note("channel_low", channel.low);
        evidence.note("vwap", vwap);

        let surge = channel.avg_volume > 0.0
            && bar.volume > channel.avg_volume * self.params.volume_multiplier;
        if bar.close > channel.high {
            evidence.bull(0.5, "close broke above the prior range");
            if surge {
                evidence.bull(0.3, "breakout on above-average volume");
            }
            if bar.close > vwap {
                evidence.bull(0.2, "close above VWAP");
            }
        } else if bar.close < channel.low {
            evidence.bear(0.5, "close broke below the prior range");
            if surge {
                evidence.bear(0.3, "breakdown on above-average volume");
            }
            if bar.close < vwap {
                evidence.bear(0.2, "close below VWAP");
            }
        }
        Some(())
    }
}

impl Strategy for HighFrequencyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::one_minute()
    }

    fn required_indicators(&self) -> Vec<IndicatorSpec> {
        match self.params.mode {
            HighFrequencyMode::Momentum => vec![self.fast(), self.slow(), self.rsi()],
            HighFrequencyMode::MeanReversion => vec![self.bands(), self.rsi(), self.williams()],
            HighFrequencyMode::Breakout => vec![self.vwap()],
        }
    }

    fn generate_signal(&self, bars: &[Bar], indicators: &IndicatorSet) -> Option<Signal> {
        let bar = bars.last()?;
        let mut evidence = Evidence::new(self.params.mode.as_str());
        match self.params.mode {
            HighFrequencyMode::Momentum => self.momentum(indicators, &mut evidence)?,
            HighFrequencyMode::MeanReversion => {
                self.mean_reversion(bar, indicators, &mut evidence)?
            }
            HighFrequencyMode::Breakout => self.breakout(bars, indicators, &mut evidence)?,
        }
        evidence.decide(bar, self.params.min_confidence, SignalAction::Sell)
    }

    fn parameters(&self) -> ParameterSet {
        self.raw.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Strategy, StrategyFamily};
    use crate::services::indicators::IndicatorSet;
    use crate::value_objects::bar::Bar;
    use crate::value_objects::parameter::ParameterSet;
    use crate::value_objects::signal::{Signal, SignalAction};

    fn bars(closes: &[f64], volumes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (close, volume))| Bar {
                symbol: "ETHUSD".to_string(),
                timestamp: i as i64 * 60,
                open: *close,
                high: close + 0.5,
                low: close - 0.5,
                close: *close,
                volume: *volume,
            })
            .collect()
    }

    fn signal_for(params: ParameterSet, bars: &[Bar]) -> Option<Signal> {
        let strategy = StrategyFamily::HighFrequency.build(&params).unwrap();
        let indicators = IndicatorSet::from_bars(&strategy.required_indicators(), bars);
        strategy.generate_signal(bars, &indicators)
    }

    #[test]
    fn breakout_on_volume_surge_buys() {
        let mut closes = vec![100.0; 20];
        closes.push(105.0);
        let mut volumes = vec![10.0; 20];
        volumes.push(50.0);
        let signal = signal_for(
            ParameterSet::new().with("sub_strategy", "breakout"),
            &bars(&closes, &volumes),
        )
        .unwrap();
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.confidence, 1.0);
        assert_eq!(signal.price, 105.0);
    }

    #[test]
    fn momentum_without_warm_up_is_silent() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let volumes = vec![1.0; 10];
        assert!(signal_for(ParameterSet::new(), &bars(&closes, &volumes)).is_none());
    }

    #[test]
    fn mean_reversion_sells_a_spike() {
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 2) as f64 * 0.2).collect();
        closes.push(110.0);
        let volumes = vec![1.0; closes.len()];
        let signal = signal_for(
            ParameterSet::new().with("sub_strategy", "mean_reversion"),
            &bars(&closes, &volumes),
        )
        .unwrap();
        assert_eq!(signal.action, SignalAction::Sell);
        assert!(signal.reasoning.contains("upper Bollinger band"));
        assert!(signal.reasoning.contains("Williams %R"));
        assert!(signal.reasoning.contains("overbought"));
    }
}
