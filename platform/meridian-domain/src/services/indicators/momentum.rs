use super::moving_average::{ema, sma};
use super::{highest, lowest, mean, same_len, tail};

/// Simple-average RSI: gains and losses are plain means over the trailing
/// `period` changes (no Wilder smoothing). Output length is `len - period`.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() <= period {
        return Vec::new();
    }
    let changes: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
    changes
        .windows(period)
        .map(|window| {
            let gains: f64 = window.iter().filter(|d| **d > 0.0).sum();
            let losses: f64 = window.iter().filter(|d| **d < 0.0).map(|d| -d).sum();
            let avg_gain = gains / period as f64;
            let avg_loss = losses / period as f64;
            if avg_loss == 0.0 {
                return 100.0;
            }
            let rs = avg_gain / avg_loss;
            (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// `macd` keeps its full length even while `signal` is still warming up;
/// `histogram` is aligned with `signal` from the tail.
pub fn macd(data: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_line = ema(data, fast);
    let slow_line = ema(data, slow);
    let len = fast_line.len().min(slow_line.len());
    if len == 0 {
        return MacdSeries::default();
    }
    let macd_line: Vec<f64> = tail(&fast_line, len)
        .iter()
        .zip(tail(&slow_line, len))
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal);
    let histogram = tail(&macd_line, signal_line.len())
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();
    MacdSeries {
        macd: macd_line,
        signal: signal_line,
        histogram,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KdjSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub j: Vec<f64>,
}

/// K is the SMA of RSV, D the SMA of K, J = 3K - 2D. All three share D's length.
pub fn kdj(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    k_smooth: usize,
    d_smooth: usize,
) -> KdjSeries {
    if period == 0 || !same_len(highs, lows, closes) || closes.len() < period {
        return KdjSeries::default();
    }
    let rsv: Vec<f64> = (period - 1..closes.len())
        .map(|i| {
            let start = i + 1 - period;
            let hh = highest(&highs[start..=i]);
            let ll = lowest(&lows[start..=i]);
            let range = hh - ll;
            if range == 0.0 {
                50.0
            } else {
                (closes[i] - ll) / range * 100.0
            }
        })
        .collect();
    let k_full = sma(&rsv, k_smooth);
    let d = sma(&k_full, d_smooth);
    if d.is_empty() {
        return KdjSeries::default();
    }
    let k = tail(&k_full, d.len()).to_vec();
    let j = k.iter().zip(&d).map(|(k, d)| 3.0 * k - 2.0 * d).collect();
    KdjSeries { k, d, j }
}

/// Commodity channel index over the typical price `(H + L + C) / 3`;
/// 0 when the mean absolute deviation is 0.
pub fn cci(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || !same_len(highs, lows, closes) || closes.len() < period {
        return Vec::new();
    }
    let typical: Vec<f64> = highs
        .iter()
        .zip(lows)
        .zip(closes)
        .map(|((h, l), c)| (h + l + c) / 3.0)
        .collect();
    typical
        .windows(period)
        .map(|window| {
            let avg = mean(window);
            let deviation = window.iter().map(|tp| (tp - avg).abs()).sum::<f64>() / period as f64;
            if deviation == 0.0 {
                return 0.0;
            }
            let last = window[window.len() - 1];
            (last - avg) / (0.015 * deviation)
        })
        .collect()
}

/// Williams %R in [-100, 0]; -50 when the window has no range.
pub fn williams_r(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || !same_len(highs, lows, closes) || closes.len() < period {
        return Vec::new();
    }
    (period - 1..closes.len())
        .map(|i| {
            let start = i + 1 - period;
            let hh = highest(&highs[start..=i]);
            let ll = lowest(&lows[start..=i]);
            let range = hh - ll;
            if range == 0.0 {
                return -50.0;
            }
            ((hh - closes[i]) / range * -100.0).clamp(-100.0, 0.0)
        })
        .collect()
}
