use super::mean;

pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }
    data.windows(period).map(mean).collect()
}

/// Seeded with the SMA of the first `period` values, then
/// `v[i] = v[i-1] + a * (x[i] - v[i-1])`, `a = 2 / (period + 1)`.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(data.len() - period + 1);
    let mut prev = mean(&data[..period]);
    out.push(prev);
    for x in &data[period..] {
        prev += alpha * (x - prev);
        out.push(prev);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{ema, sma};

    #[test]
    fn sma_matches_hand_computed_windows() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn short_input_or_zero_period_is_empty() {
        assert!(sma(&[1.0, 2.0], 3).is_empty());
        assert!(sma(&[1.0, 2.0], 0).is_empty());
        assert!(ema(&[1.0, 2.0], 3).is_empty());
    }

    #[test]
    fn ema_seed_and_recurrence() {
        let data = [2.0, 4.0, 6.0, 8.0];
        let out = ema(&data, 3);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], 4.0);
        assert!((out[1] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn constant_input_is_exact() {
        let data = vec![7.25; 40];
        assert!(sma(&data, 10).iter().all(|v| *v == 7.25));
        assert!(ema(&data, 12).iter().all(|v| *v == 7.25));
    }
}
