/// Trailing volume-weighted close; 0 when the window traded no volume.
pub fn vwap(closes: &[f64], volumes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() != volumes.len() || closes.len() < period {
        return Vec::new();
    }
    (0..=closes.len() - period)
        .map(|start| {
            let end = start + period;
            let volume: f64 = volumes[start..end].iter().sum();
            if volume == 0.0 {
                return 0.0;
            }
            let notional: f64 = closes[start..end]
                .iter()
                .zip(&volumes[start..end])
                .map(|(c, v)| c * v)
                .sum();
            notional / volume
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::vwap;

    #[test]
    fn weights_by_volume() {
        let out = vwap(&[10.0, 20.0], &[1.0, 3.0], 2);
        assert_eq!(out, vec![17.5]);
    }

    #[test]
    fn zero_volume_window_is_zero() {
        assert_eq!(vwap(&[10.0, 11.0, 12.0], &[0.0, 0.0, 5.0], 2), vec![0.0, 12.0]);
    }

    #[test]
    fn mismatched_columns_are_empty() {
        assert!(vwap(&[1.0, 2.0], &[1.0], 1).is_empty());
    }
}
