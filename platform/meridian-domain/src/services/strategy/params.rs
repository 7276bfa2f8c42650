use crate::errors::ParameterError;
use crate::services::indicators::classify::{rsi_hint, Hint, RSI_OVERBOUGHT, RSI_OVERSOLD};
use crate::value_objects::parameter::{
    require_less, require_period, require_positive, require_unit_interval, ParameterSet,
};

pub(crate) const MIN_CONFIDENCE: &str = "min_confidence";
pub(crate) const SUB_STRATEGY: &str = "sub_strategy";
pub(crate) const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// RSI period plus its overbought/oversold thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiBand {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl RsiBand {
    pub(crate) fn read(params: &ParameterSet) -> Result<Self, ParameterError> {
        let period = require_period("rsi_period", params.get_usize("rsi_period")?)?;
        let overbought = params.get_f64("rsi_overbought")?;
        let oversold = params.get_f64("rsi_oversold")?;
        for (key, value) in [("rsi_overbought", overbought), ("rsi_oversold", oversold)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ParameterError::invalid(key, format!("{value} is outside [0, 100]")));
            }
        }
        require_less("rsi_oversold", oversold, "rsi_overbought", overbought)?;
        Ok(Self {
            period,
            overbought,
            oversold,
        })
    }

    pub(crate) fn defaults(params: ParameterSet) -> ParameterSet {
        params
            .with("rsi_period", 14usize)
            .with("rsi_overbought", RSI_OVERBOUGHT)
            .with("rsi_oversold", RSI_OVERSOLD)
    }

    pub(crate) fn hint(&self, rsi: f64) -> Hint {
        rsi_hint(rsi, self.overbought, self.oversold)
    }
}

/// Reads `fast_period` < `slow_period`.
pub(crate) fn read_fast_slow(params: &ParameterSet) -> Result<(usize, usize), ParameterError> {
    let fast = require_period("fast_period", params.get_usize("fast_period")?)?;
    let slow = require_period("slow_period", params.get_usize("slow_period")?)?;
    require_less("fast_period", fast as f64, "slow_period", slow as f64)?;
    Ok((fast, slow))
}

pub(crate) fn read_period(params: &ParameterSet, key: &str) -> Result<usize, ParameterError> {
    require_period(key, params.get_usize(key)?)
}

pub(crate) fn read_positive(params: &ParameterSet, key: &str) -> Result<f64, ParameterError> {
    require_positive(key, params.get_f64(key)?)
}

pub(crate) fn read_min_confidence(params: &ParameterSet) -> Result<f64, ParameterError> {
    require_unit_interval(MIN_CONFIDENCE, params.get_f64(MIN_CONFIDENCE)?)
}

/// Rejects keys the variant does not define, so typos surface before a run.
pub(crate) fn reject_unknown(
    params: &ParameterSet,
    defaults: &ParameterSet,
    family: &str,
) -> Result<(), ParameterError> {
    match params.iter().find(|(key, _)| !defaults.contains(key)) {
        Some((key, _)) => Err(ParameterError::invalid(
            key,
            format!("not a parameter of {family}"),
        )),
        None => Ok(()),
    }
}

pub(crate) fn unknown_mode(value: &str, choices: &[&str]) -> ParameterError {
    ParameterError::invalid(
        SUB_STRATEGY,
        format!("`{value}` is not one of {}", choices.join(", ")),
    )
}

#[cfg(test)]
mod tests {
    use super::{read_fast_slow, Hint, RsiBand};
    use crate::errors::ParameterError;
    use crate::value_objects::parameter::ParameterSet;

    #[test]
    fn fast_must_be_below_slow() {
        let params = ParameterSet::new()
            .with("fast_period", 26usize)
            .with("slow_period", 12usize);
        assert!(matches!(
            read_fast_slow(&params),
            Err(ParameterError::Invalid { .. })
        ));
    }

    #[test]
    fn rsi_band_orders_thresholds() {
        let good = RsiBand::defaults(ParameterSet::new());
        assert_eq!(RsiBand::read(&good).unwrap().overbought, 70.0);
        let inverted = good.with("rsi_oversold", 80.0);
        assert!(RsiBand::read(&inverted).is_err());
    }

    #[test]
    fn rsi_band_hint_uses_configured_thresholds() {
        let band = RsiBand::read(
            &RsiBand::defaults(ParameterSet::new())
                .with("rsi_overbought", 80.0)
                .with("rsi_oversold", 20.0),
        )
        .unwrap();
        assert_eq!(band.hint(75.0), Hint::Hold);
        assert_eq!(band.hint(85.0), Hint::Sell);
        assert_eq!(band.hint(15.0), Hint::Buy);
        assert_eq!(band.hint(20.0), Hint::Hold);
    }
}
