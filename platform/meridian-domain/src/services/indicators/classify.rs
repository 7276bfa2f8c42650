//! Threshold and crossover rules that turn raw indicator readings into hints.

use super::{BollingerBands, KdjSeries, MacdSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    Golden,
    Death,
    None,
}

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const CCI_UPPER: f64 = 100.0;
pub const CCI_LOWER: f64 = -100.0;
pub const WILLIAMS_OVERBOUGHT: f64 = -20.0;
pub const WILLIAMS_OVERSOLD: f64 = -80.0;

pub fn rsi_hint(value: f64, overbought: f64, oversold: f64) -> Hint {
    if value > overbought {
        Hint::Sell
    } else if value < oversold {
        Hint::Buy
    } else {
        Hint::Hold
    }
}

/// Compares the prior and current bar of a fast/slow pair.
pub fn cross(prev_fast: f64, prev_slow: f64, fast: f64, slow: f64) -> Cross {
    if prev_fast <= prev_slow && fast > slow {
        Cross::Golden
    } else if prev_fast >= prev_slow && fast < slow {
        Cross::Death
    } else {
        Cross::None
    }
}

/// Crossover on the last two tail-aligned points of two series.
pub fn series_cross(fast: &[f64], slow: &[f64]) -> Cross {
    match (last_two(fast), last_two(slow)) {
        (Some((pf, f)), Some((ps, s))) => cross(pf, ps, f, s),
        _ => Cross::None,
    }
}

pub fn macd_hint(series: &MacdSeries) -> Hint {
    match series_cross(&series.macd, &series.signal) {
        Cross::Golden => Hint::Buy,
        Cross::Death => Hint::Sell,
        Cross::None => Hint::Hold,
    }
}

pub fn kdj_hint(series: &KdjSeries) -> Hint {
    match series_cross(&series.k, &series.d) {
        Cross::Golden => Hint::Buy,
        Cross::Death => Hint::Sell,
        Cross::None => Hint::Hold,
    }
}

pub fn cci_hint(value: f64) -> Hint {
    if value > CCI_UPPER {
        Hint::Sell
    } else if value < CCI_LOWER {
        Hint::Buy
    } else {
        Hint::Hold
    }
}

pub fn williams_r_hint(value: f64) -> Hint {
    if value > WILLIAMS_OVERBOUGHT {
        Hint::Sell
    } else if value < WILLIAMS_OVERSOLD {
        Hint::Buy
    } else {
        Hint::Hold
    }
}

pub fn bollinger_hint(price: f64, bands: &BollingerBands) -> Hint {
    match (bands.upper.last(), bands.lower.last()) {
        (Some(upper), _) if price > *upper => Hint::Sell,
        (_, Some(lower)) if price < *lower => Hint::Buy,
        _ => Hint::Hold,
    }
}

/// `(previous, latest)` of a series with at least two points.
pub fn last_two(values: &[f64]) -> Option<(f64, f64)> {
    match values {
        [.., prev, last] => Some((*prev, *last)),
        _ => None,
    }
}
