//! Pure indicator functions over price/volume columns.
//!
//! Every function returns a series shorter than its input by the warm-up
//! (`len - warm_up + 1`), aligned to the tail of the input, or an empty
//! series when the input is too short. Degenerate windows produce fixed
//! sentinels instead of NaN.

mod bands;
pub mod classify;
mod momentum;
mod moving_average;
mod set;
mod volume;

pub use bands::{bollinger, BollingerBands};
pub use momentum::{cci, kdj, macd, rsi, williams_r, KdjSeries, MacdSeries};
pub use moving_average::{ema, sma};
pub use set::{IndicatorSet, IndicatorSpec, IndicatorValues};
pub use volume::vwap;

/// Running mean. Constant input yields that constant exactly.
pub(crate) fn mean(values: &[f64]) -> f64 {
    let mut m = 0.0;
    for (i, x) in values.iter().enumerate() {
        m += (x - m) / (i + 1) as f64;
    }
    m
}

pub(crate) fn highest(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub(crate) fn lowest(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Last `len` elements of `values` (all of them when shorter).
pub(crate) fn tail(values: &[f64], len: usize) -> &[f64] {
    &values[values.len().saturating_sub(len)..]
}

pub(crate) fn same_len(a: &[f64], b: &[f64], c: &[f64]) -> bool {
    a.len() == b.len() && b.len() == c.len()
}
