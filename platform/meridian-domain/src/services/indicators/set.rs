use super::{
    bollinger, cci, ema, kdj, macd, rsi, sma, vwap, williams_r, BollingerBands, KdjSeries,
    MacdSeries,
};
use crate::value_objects::bar::{Bar, BarColumns, ColumnView};
use std::collections::BTreeMap;

/// An indicator a strategy declares it needs, with its periods.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorSpec {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        multiplier: f64,
    },
    Kdj {
        period: usize,
        k_smooth: usize,
        d_smooth: usize,
    },
    Cci(usize),
    WilliamsR(usize),
    Vwap(usize),
}

impl IndicatorSpec {
    /// Stable lookup key, e.g. `ema_12` or `macd_12_26_9`.
    pub fn key(&self) -> String {
        match self {
            IndicatorSpec::Sma(p) => format!("sma_{p}"),
            IndicatorSpec::Ema(p) => format!("ema_{p}"),
            IndicatorSpec::Rsi(p) => format!("rsi_{p}"),
            IndicatorSpec::Macd { fast, slow, signal } => format!("macd_{fast}_{slow}_{signal}"),
            IndicatorSpec::Bollinger { period, multiplier } => {
                format!("bollinger_{period}_{multiplier}")
            }
            IndicatorSpec::Kdj {
                period,
                k_smooth,
                d_smooth,
            } => format!("kdj_{period}_{k_smooth}_{d_smooth}"),
            IndicatorSpec::Cci(p) => format!("cci_{p}"),
            IndicatorSpec::WilliamsR(p) => format!("williams_r_{p}"),
            IndicatorSpec::Vwap(p) => format!("vwap_{p}"),
        }
    }

    /// Bars needed before every series of this indicator has a value.
    pub fn warm_up(&self) -> usize {
        match self {
            IndicatorSpec::Sma(p)
            | IndicatorSpec::Ema(p)
            | IndicatorSpec::Cci(p)
            | IndicatorSpec::WilliamsR(p)
            | IndicatorSpec::Vwap(p) => *p,
            IndicatorSpec::Rsi(p) => p + 1,
            IndicatorSpec::Macd { fast, slow, signal } => {
                (*fast).max(*slow) + signal.saturating_sub(1)
            }
            IndicatorSpec::Bollinger { period, .. } => *period,
            IndicatorSpec::Kdj {
                period,
                k_smooth,
                d_smooth,
            } => period + k_smooth.saturating_sub(1) + d_smooth.saturating_sub(1),
        }
    }

    /// `None` while the input is shorter than the primary warm-up.
    pub fn compute(&self, columns: ColumnView<'_>) -> Option<IndicatorValues> {
        let closes = columns.closes;
        let values = match self {
            IndicatorSpec::Sma(p) => IndicatorValues::Line(sma(closes, *p)),
            IndicatorSpec::Ema(p) => IndicatorValues::Line(ema(closes, *p)),
            IndicatorSpec::Rsi(p) => IndicatorValues::Line(rsi(closes, *p)),
            IndicatorSpec::Macd { fast, slow, signal } => {
                IndicatorValues::Macd(macd(closes, *fast, *slow, *signal))
            }
            IndicatorSpec::Bollinger { period, multiplier } => {
                IndicatorValues::Bands(bollinger(closes, *period, *multiplier))
            }
            IndicatorSpec::Kdj {
                period,
                k_smooth,
                d_smooth,
            } => IndicatorValues::Kdj(kdj(
                columns.highs,
                columns.lows,
                closes,
                *period,
                *k_smooth,
                *d_smooth,
            )),
            IndicatorSpec::Cci(p) => {
                IndicatorValues::Line(cci(columns.highs, columns.lows, closes, *p))
            }
            IndicatorSpec::WilliamsR(p) => {
                IndicatorValues::Line(williams_r(columns.highs, columns.lows, closes, *p))
            }
            IndicatorSpec::Vwap(p) => IndicatorValues::Line(vwap(closes, columns.volumes, *p)),
        };
        (!values.is_empty()).then_some(values)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValues {
    Line(Vec<f64>),
    Macd(MacdSeries),
    Bands(BollingerBands),
    Kdj(KdjSeries),
}

impl IndicatorValues {
    pub fn is_empty(&self) -> bool {
        match self {
            IndicatorValues::Line(values) => values.is_empty(),
            IndicatorValues::Macd(series) => series.macd.is_empty(),
            IndicatorValues::Bands(bands) => bands.is_empty(),
            IndicatorValues::Kdj(series) => series.k.is_empty(),
        }
    }
}

/// Indicator series keyed by [`IndicatorSpec::key`]. Missing warm-up means a
/// missing key, never a panic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    values: BTreeMap<String, IndicatorValues>,
}

impl IndicatorSet {
    pub fn from_bars(specs: &[IndicatorSpec], bars: &[Bar]) -> Self {
        Self::compute(specs, BarColumns::from_bars(bars).view())
    }

    pub fn compute(specs: &[IndicatorSpec], columns: ColumnView<'_>) -> Self {
        let values = specs
            .iter()
            .filter_map(|spec| spec.compute(columns).map(|values| (spec.key(), values)))
            .collect();
        Self { values }
    }

    pub fn contains(&self, spec: &IndicatorSpec) -> bool {
        self.values.contains_key(&spec.key())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn line(&self, spec: &IndicatorSpec) -> Option<&[f64]> {
        match self.values.get(&spec.key())? {
            IndicatorValues::Line(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn latest(&self, spec: &IndicatorSpec) -> Option<f64> {
        self.line(spec)?.last().copied()
    }

    pub fn macd(&self, spec: &IndicatorSpec) -> Option<&MacdSeries> {
        match self.values.get(&spec.key())? {
            IndicatorValues::Macd(series) => Some(series),
            _ => None,
        }
    }

    pub fn bands(&self, spec: &IndicatorSpec) -> Option<&BollingerBands> {
        match self.values.get(&spec.key())? {
            IndicatorValues::Bands(bands) => Some(bands),
            _ => None,
        }
    }

    pub fn kdj(&self, spec: &IndicatorSpec) -> Option<&KdjSeries> {
        match self.values.get(&spec.key())? {
            IndicatorValues::Kdj(series) => Some(series),
            _ => None,
        }
    }
}
