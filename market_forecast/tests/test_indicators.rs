use approx::assert_relative_eq;
use chrono::NaiveDate;
use market_forecast::data::PriceSeries;
use market_forecast::error::ForecastError;
use market_forecast::indicators::{IndicatorEngine, IndicatorSet};
use pretty_assertions::assert_eq;
use rstest::rstest;
use trade_math::IndicatorKind;

fn series(values: Vec<f64>) -> PriceSeries {
    PriceSeries::daily(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(), values).unwrap()
}

#[test]
fn test_sma_alignment() {
    let sma = IndicatorEngine::compute_sma(&series(vec![1.0, 2.0, 3.0, 4.0, 5.0]), 3).unwrap();
    assert_eq!(sma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
}

#[test]
fn test_sma_full_window() {
    let sma = IndicatorEngine::compute_sma(&series(vec![2.0, 4.0]), 2).unwrap();
    assert_eq!(sma, vec![None, Some(3.0)]);
}

#[test]
fn test_rsi_wilder_smoothing() {
    let rsi = IndicatorEngine::compute_rsi(&series(vec![10.0, 11.0, 10.0, 11.0]), 2).unwrap();
    assert_eq!(rsi.len(), 4);
    assert_eq!(rsi[0], None);
    assert_eq!(rsi[1], None);
    assert_relative_eq!(rsi[2].unwrap(), 50.0);
    assert_relative_eq!(rsi[3].unwrap(), 75.0);
}

#[test]
fn test_rsi_without_losses_is_100() {
    let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let rsi = IndicatorEngine::compute_rsi(&series(values), 14).unwrap();
    assert!(rsi[..14].iter().all(Option::is_none));
    assert!(rsi[14..].iter().all(|v| *v == Some(100.0)));
}

#[test]
fn test_rsi_stays_in_range() {
    let values: Vec<f64> = (0..200)
        .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin() + (i % 7) as f64)
        .collect();
    let rsi = IndicatorEngine::compute_rsi(&series(values), 14).unwrap();
    for value in rsi.into_iter().flatten() {
        assert!((0.0..=100.0).contains(&value));
    }
}

#[rstest]
#[case(0)]
#[case(6)]
fn test_invalid_window(#[case] window: usize) {
    let prices = series(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    for result in [
        IndicatorEngine::compute_sma(&prices, window),
        IndicatorEngine::compute_rsi(&prices, window),
    ] {
        assert!(matches!(
            result,
            Err(ForecastError::InvalidParameter { parameter: "window", .. })
        ));
    }
}

#[test]
fn test_empty_series() {
    let empty = PriceSeries::new(Vec::new()).unwrap();
    assert!(matches!(
        IndicatorEngine::compute_sma(&empty, 3),
        Err(ForecastError::InsufficientData { .. })
    ));
    assert!(matches!(
        IndicatorEngine::compute_rsi(&empty, 3),
        Err(ForecastError::InsufficientData { .. })
    ));
}

#[test]
fn test_indicator_set() {
    let values: Vec<f64> = (0..60).map(|i| 50.0 + i as f64).collect();
    let prices = series(values);
    let set = IndicatorSet::compute(
        &prices,
        &[IndicatorKind::Sma(20), IndicatorKind::Sma(50), IndicatorKind::Rsi(14)],
    )
    .unwrap();

    assert_eq!(set.len(), 3);
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["RSI_14", "SMA_20", "SMA_50"]);
    assert_eq!(set.dates(), prices.dates().as_slice());

    let sma50 = set.get("SMA_50").unwrap();
    assert_eq!(sma50.len(), 60);
    assert_eq!(sma50[48], None);
    assert_relative_eq!(sma50[49].unwrap(), 74.5);
    assert_relative_eq!(set.latest("SMA_20").unwrap(), 99.5);
    assert_eq!(set.latest("RSI_14"), Some(100.0));
    assert!(set.get("SMA_200").is_none());
}

#[test]
fn test_indicator_set_propagates_window_errors() {
    let prices = series(vec![1.0; 10]);
    assert!(IndicatorSet::compute(&prices, &[IndicatorKind::Sma(200)]).is_err());
}
