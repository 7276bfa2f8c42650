use super::mean;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerBands {
    pub fn len(&self) -> usize {
        self.middle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }
}

/// Middle band is the SMA; the envelope uses the population standard deviation.
pub fn bollinger(data: &[f64], period: usize, multiplier: f64) -> BollingerBands {
    if period == 0 || data.len() < period {
        return BollingerBands::default();
    }
    let mut bands = BollingerBands::default();
    for window in data.windows(period) {
        let middle = mean(window);
        let variance = window
            .iter()
            .map(|x| {
                let diff = x - middle;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        let width = multiplier * variance.sqrt();
        bands.upper.push(middle + width);
        bands.middle.push(middle);
        bands.lower.push(middle - width);
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::bollinger;

    #[test]
    fn bands_collapse_on_constant_input() {
        let bands = bollinger(&[3.0; 25], 20, 2.0);
        assert_eq!(bands.len(), 6);
        assert!(bands.upper.iter().all(|v| *v == 3.0));
        assert!(bands.lower.iter().all(|v| *v == 3.0));
    }

    #[test]
    fn uses_population_deviation() {
        let bands = bollinger(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8, 1.0);
        assert!((bands.middle[0] - 5.0).abs() < 1e-12);
        assert!((bands.upper[0] - 7.0).abs() < 1e-12);
        assert!((bands.lower[0] - 3.0).abs() < 1e-12);
    }
}
