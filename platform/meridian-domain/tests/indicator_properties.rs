use meridian_domain::services::indicators::{
    bollinger, cci, ema, kdj, macd, rsi, sma, vwap, williams_r, IndicatorSet, IndicatorSpec,
};
use meridian_domain::value_objects::bar::Bar;

fn flat(len: usize, price: f64) -> Vec<f64> {
    vec![price; len]
}

fn flat_bars(len: usize, price: f64) -> Vec<Bar> {
    (0..len)
        .map(|i| Bar {
            symbol: "ETHUSD".to_string(),
            timestamp: i as i64 * 3_600,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 10.0,
        })
        .collect()
}

#[test]
fn constant_prices_pin_every_oscillator_to_its_sentinel() {
    let closes = flat(30, 50.0);

    let rsi = rsi(&closes, 14);
    assert_eq!(rsi.len(), 16);
    assert!(rsi.iter().all(|v| *v == 100.0));

    assert!(cci(&closes, &closes, &closes, 20).iter().all(|v| *v == 0.0));
    assert!(williams_r(&closes, &closes, &closes, 14)
        .iter()
        .all(|v| *v == -50.0));

    let series = kdj(&closes, &closes, &closes, 9, 3, 3);
    assert!(!series.k.is_empty());
    assert!(series.k.iter().chain(&series.d).chain(&series.j).all(|v| *v == 50.0));

    let bands = bollinger(&closes, 20, 2.0);
    assert_eq!(bands.len(), 11);
    assert!(bands.upper.iter().zip(&bands.lower).all(|(u, l)| u == l));
}

#[test]
fn constant_prices_give_a_flat_macd() {
    let closes = flat(40, 12.5);
    let series = macd(&closes, 12, 26, 9);
    assert_eq!(series.macd.len(), 15);
    assert_eq!(series.signal.len(), 7);
    assert_eq!(series.histogram.len(), 7);
    assert!(series.macd.iter().all(|v| *v == 0.0));
    assert!(series.histogram.iter().all(|v| *v == 0.0));
}

#[test]
fn ema_is_seeded_with_the_first_sma() {
    let closes: Vec<f64> = (1..=25).map(|i| (i as f64).sqrt() * 10.0).collect();
    let ema = ema(&closes, 10);
    let sma = sma(&closes, 10);
    assert_eq!(ema.len(), sma.len());
    assert!((ema[0] - sma[0]).abs() < 1e-12);
    let alpha = 2.0 / 11.0;
    let expected = sma[0] + alpha * (closes[10] - sma[0]);
    assert!((ema[1] - expected).abs() < 1e-9);
}

#[test]
fn vwap_without_volume_is_zero() {
    let closes = [10.0, 11.0, 12.0];
    assert_eq!(vwap(&closes, &[0.0, 0.0, 0.0], 3), vec![0.0]);
    assert!(vwap(&closes, &[1.0, 1.0], 2).is_empty());
}

#[test]
fn short_history_means_missing_keys() {
    let specs = vec![
        IndicatorSpec::Sma(5),
        IndicatorSpec::Rsi(14),
        IndicatorSpec::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        },
    ];
    let set = IndicatorSet::from_bars(&specs, &flat_bars(10, 3.0));
    assert!(set.contains(&IndicatorSpec::Sma(5)));
    assert!(!set.contains(&IndicatorSpec::Rsi(14)));
    assert!(set.macd(&specs[2]).is_none());
    assert_eq!(set.latest(&IndicatorSpec::Sma(5)), Some(3.0));

    let set = IndicatorSet::from_bars(&specs, &flat_bars(40, 3.0));
    assert_eq!(set.len(), 3);
    assert_eq!(set.latest(&IndicatorSpec::Rsi(14)), Some(100.0));
}
