use super::evidence::{prior_channel, Evidence};
use super::params::{
    read_fast_slow, read_min_confidence, read_period, read_positive, unknown_mode, RsiBand,
    DEFAULT_MIN_CONFIDENCE, MIN_CONFIDENCE, SUB_STRATEGY,
};
use super::Strategy;
use crate::errors::ParameterError;
use crate::services::indicators::classify::{
    bollinger_hint, cci_hint, macd_hint, series_cross, Cross, Hint,
};
use crate::services::indicators::{IndicatorSet, IndicatorSpec};
use crate::value_objects::bar::Bar;
use crate::value_objects::parameter::ParameterSet;
use crate::value_objects::signal::{Signal, SignalAction};
use crate::value_objects::timeframe::Timeframe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyMode {
    Trend,
    MeanReversion,
    Breakout,
}

impl DailyMode {
    pub const NAMES: &'static [&'static str] = &["trend", "mean_reversion", "breakout"];

    pub fn parse(value: &str) -> Result<Self, ParameterError> {
        match value {
            "trend" => Ok(Self::Trend),
            "mean_reversion" => Ok(Self::MeanReversion),
            "breakout" => Ok(Self::Breakout),
            other => Err(unknown_mode(other, Self::NAMES)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::MeanReversion => "mean_reversion",
            Self::Breakout => "breakout",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyParams {
    pub mode: DailyMode,
    pub fast_period: usize,
    pub slow_period: usize,
    pub rsi: RsiBand,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub cci_period: usize,
    pub breakout_period: usize,
    pub volume_multiplier: f64,
    pub min_confidence: f64,
}

impl DailyParams {
    pub fn defaults() -> ParameterSet {
        RsiBand::defaults(ParameterSet::new())
            .with(SUB_STRATEGY, "trend")
            .with("fast_period", 50usize)
            .with("slow_period", 200usize)
            .with("bollinger_period", 20usize)
            .with("bollinger_multiplier", 2.0)
            .with("cci_period", 20usize)
            .with("breakout_period", 55usize)
            .with("volume_multiplier", 1.5)
            .with(MIN_CONFIDENCE, DEFAULT_MIN_CONFIDENCE)
    }
}

impl TryFrom<&ParameterSet> for DailyParams {
    type Error = ParameterError;

    fn try_from(params: &ParameterSet) -> Result<Self, Self::Error> {
        let (fast_period, slow_period) = read_fast_slow(params)?;
        Ok(Self {
            mode: DailyMode::parse(params.get_text(SUB_STRATEGY)?)?,
            fast_period,
            slow_period,
            rsi: RsiBand::read(params)?,
            bollinger_period: read_period(params, "bollinger_period")?,
            bollinger_multiplier: read_positive(params, "bollinger_multiplier")?,
            cci_period: read_period(params, "cci_period")?,
            breakout_period: read_period(params, "breakout_period")?,
            volume_multiplier: read_positive(params, "volume_multiplier")?,
            min_confidence: read_min_confidence(params)?,
        })
    }
}

/// End-of-day rules. `trend` exits the whole book on a death cross.
pub struct DailyStrategy {
    name: String,
    params: DailyParams,
    raw: ParameterSet,
}

impl DailyStrategy {
    pub fn new(params: DailyParams, raw: ParameterSet) -> Self {
        Self {
            name: format!("daily:{}", params.mode.as_str()),
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

    fn trend_ema(&self) -> IndicatorSpec {
        IndicatorSpec::Ema(self.params.fast_period)
    }

    fn macd(&self) -> IndicatorSpec {
        IndicatorSpec::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        }
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

    fn cci(&self) -> IndicatorSpec {
        IndicatorSpec::Cci(self.params.cci_period)
    }

    fn trend(&self, indicators: &IndicatorSet, evidence: &mut Evidence) -> Option<()> {
        let fast = indicators.line(&self.fast())?;
        let slow = indicators.line(&self.slow())?;
        let (fast_now, slow_now) = (*fast.last()?, *slow.last()?);
        evidence.note("fast_sma", fast_now);
        evidence.note("slow_sma", slow_now);

        match series_cross(fast, slow) {
            Cross::Golden => evidence.bull(0.6, "golden cross"),
            Cross::Death => evidence.bear(0.6, "death cross"),
            Cross::None => {}
        }
        if fast_now > slow_now {
            evidence.bull(0.2, "fast SMA above slow SMA");
        } else if fast_now < slow_now {
            evidence.bear(0.2, "fast SMA below slow SMA");
        }
        // MACD needs 34 bars; trend runs without it on shorter histories.
        if let Some(macd) = indicators.macd(&self.macd()) {
            match macd_hint(macd) {
                Hint::Buy => evidence.bull(0.2, "MACD crossed above its signal line"),
                Hint::Sell => evidence.bear(0.2, "MACD crossed below its signal line"),
                Hint::Hold => {}
            }
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
        let cci = indicators.latest(&self.cci())?;
        evidence.note("rsi", rsi);
        evidence.note("cci", cci);

        match bollinger_hint(bar.close, bands) {
            Hint::Buy => evidence.bull(0.4, "close below lower Bollinger band"),
            Hint::Sell => evidence.bear(0.4, "close above upper Bollinger band"),
            Hint::Hold => {}
        }
        match self.params.rsi.hint(rsi) {
            Hint::Buy => evidence.bull(0.3, format!("RSI {rsi:.1} oversold")),
            Hint::Sell => evidence.bear(0.3, format!("RSI {rsi:.1} overbought")),
            Hint::Hold => {}
        }
        match cci_hint(cci) {
            Hint::Buy => evidence.bull(0.2, format!("CCI {cci:.1} below -100")),
            Hint::Sell => evidence.bear(0.2, format!("CCI {cci:.1} above 100")),
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
        let trend = indicators.latest(&self.trend_ema())?;
        evidence.note("channel_high", channel.high);
        evidence.note("channel_low", channel.low);

        let surge = channel.avg_volume > 0.0
            && bar.volume > channel.avg_volume * self.params.volume_multiplier;
        if bar.close > channel.high {
            evidence.bull(0.5, format!("new {}-day high", self.params.breakout_period));
            if bar.close > trend {
                evidence.bull(0.2, "close above the trend EMA");
            }
            if surge {
                evidence.bull(0.3, "breakout on above-average volume");
            }
        } else if bar.close < channel.low {
            evidence.bear(0.5, format!("new {}-day low", self.params.breakout_period));
            if bar.close < trend {
                evidence.bear(0.2, "close below the trend EMA");
            }
            if surge {
                evidence.bear(0.3, "breakdown on above-average volume");
            }
        }
        Some(())
    }
}

impl Strategy for DailyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::one_day()
    }

    fn required_indicators(&self) -> Vec<IndicatorSpec> {
        match self.params.mode {
            DailyMode::Trend => vec![self.fast(), self.slow(), self.macd()],
            DailyMode::MeanReversion => vec![self.bands(), self.rsi(), self.cci()],
            DailyMode::Breakout => vec![self.trend_ema()],
        }
    }

    fn generate_signal(&self, bars: &[Bar], indicators: &IndicatorSet) -> Option<Signal> {
        let bar = bars.last()?;
        let mut evidence = Evidence::new(self.params.mode.as_str());
        let exit = match self.params.mode {
            DailyMode::Trend => {
                self.trend(indicators, &mut evidence)?;
                SignalAction::ClosePosition
            }
            DailyMode::MeanReversion => {
                self.mean_reversion(bar, indicators, &mut evidence)?;
                SignalAction::Sell
            }
            DailyMode::Breakout => {
                self.breakout(bars, indicators, &mut evidence)?;
                SignalAction::Sell
            }
        };
        evidence.decide(bar, self.params.min_confidence, exit)
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
    use crate::value_objects::signal::SignalAction;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| Bar {
                symbol: "AAPL".to_string(),
                timestamp: i as i64 * 86_400,
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: 1.0,
            })
            .collect()
    }

    fn trend_params() -> ParameterSet {
        ParameterSet::new()
            .with("fast_period", 2usize)
            .with("slow_period", 4usize)
    }

    #[test]
    fn death_cross_closes_the_position() {
        let closes = [10.0, 10.0, 10.0, 10.0, 11.0, 8.0];
        let strategy = StrategyFamily::Daily.build(&trend_params()).unwrap();
        let bars = bars(&closes);
        let indicators = IndicatorSet::from_bars(&strategy.required_indicators(), &bars);
        let signal = strategy.generate_signal(&bars, &indicators).unwrap();
        assert_eq!(signal.action, SignalAction::ClosePosition);
        assert!(signal.reasoning.contains("death cross"));
        assert_eq!(signal.metadata["sub_strategy"], "trend");
    }

    #[test]
    fn breakout_needs_a_full_channel() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let strategy = StrategyFamily::Daily
            .build(&ParameterSet::new().with("sub_strategy", "breakout"))
            .unwrap();
        let bars = bars(&closes);
        let indicators = IndicatorSet::from_bars(&strategy.required_indicators(), &bars);
        assert!(strategy.generate_signal(&bars, &indicators).is_none());
    }
}
