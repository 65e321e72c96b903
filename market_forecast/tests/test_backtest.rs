use approx::assert_relative_eq;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use market_forecast::backtest::{run_backtest, AccuracyGrade, BacktestHarness};
use market_forecast::config::{BacktestConfig, ForecastConfig};
use market_forecast::data::{PricePoint, PriceSeries};
use market_forecast::error::ForecastError;
use market_forecast::models::AdditiveModel;
use rstest::{fixture, rstest};

#[fixture]
fn trending() -> PriceSeries {
    let values = (0..200).map(|i| 80.0 + 0.25 * i as f64).collect();
    PriceSeries::daily(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), values).unwrap()
}

/// Trading-day history: weekends are missing from the dates
#[fixture]
fn weekdays() -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let points = start
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(300)
        .enumerate()
        .map(|(i, date)| PricePoint::new(date, 120.0 + 0.1 * i as f64))
        .collect();
    PriceSeries::new(points).unwrap()
}

#[rstest]
fn test_backtest_windows(trending: PriceSeries) {
    let result = run_backtest(&trending, 30, &ForecastConfig::default()).unwrap();

    assert_eq!(result.held_out().len(), 30);
    assert_eq!(result.predicted().len(), 30);
    assert_eq!(result.held_out().points(), trending.tail(30).unwrap().points());
    assert_eq!(
        result.predicted().history_end(),
        trending.points()[169].date
    );
    assert_eq!(result.predicted().dates(), result.held_out().dates());
}

#[rstest]
fn test_backtest_aligns_by_position_across_gaps(weekdays: PriceSeries) {
    let result = run_backtest(&weekdays, 30, &ForecastConfig::default()).unwrap();

    assert_eq!(result.held_out().len(), 30);
    assert_eq!(result.predicted().len(), 30);
    assert_eq!(result.held_out().points(), weekdays.tail(30).unwrap().points());

    let train_end = weekdays.points()[269].date;
    assert_eq!(result.predicted().history_end(), train_end);

    let predicted = result.predicted().dates();
    assert_eq!(predicted[0], train_end + Duration::days(1));
    for pair in predicted.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::days(1));
    }
    assert_ne!(predicted, result.held_out().dates());
    assert!(predicted
        .iter()
        .any(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));

    assert!(result.mae().unwrap().is_finite());
    assert!(result.mape().is_some());
}

#[rstest]
fn test_backtest_metrics_on_linear_data(trending: PriceSeries) {
    let result = run_backtest(&trending, 30, &ForecastConfig::default()).unwrap();

    let names: Vec<&str> = result.error_metrics().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["coverage", "mae", "mape", "rmse"]);

    assert!(result.mae().unwrap() < 0.01);
    assert!(result.mape().unwrap() < 0.01);
    assert!(result.rmse().unwrap() >= result.mae().unwrap());
    assert_eq!(result.accuracy_grade(), Some(AccuracyGrade::Excellent));
}

#[rstest]
fn test_backtest_is_deterministic(trending: PriceSeries) {
    let config = ForecastConfig::default();
    let a = run_backtest(&trending, 20, &config).unwrap();
    let b = run_backtest(&trending, 20, &config).unwrap();
    assert_eq!(a, b);
}

#[rstest]
#[case(0)]
#[case(200)]
#[case(250)]
fn test_holdout_out_of_range(trending: PriceSeries, #[case] holdout: usize) {
    assert!(matches!(
        run_backtest(&trending, holdout, &ForecastConfig::default()),
        Err(ForecastError::InvalidParameter { parameter: "holdout", .. })
    ));
}

#[rstest]
fn test_training_window_too_short(trending: PriceSeries) {
    assert!(matches!(
        run_backtest(&trending, 180, &ForecastConfig::default()),
        Err(ForecastError::InsufficientData {
            required: 30,
            actual: 20
        })
    ));

    let model = AdditiveModel::new(ForecastConfig::default()).unwrap();
    let config = BacktestConfig::default().with_min_training_points(10);
    let harness = BacktestHarness::new(model, config).unwrap();
    assert!(harness.run(&trending, 180).is_ok());
}

#[test]
fn test_harness_config_validated() {
    let model = AdditiveModel::new(ForecastConfig::default()).unwrap();
    let config = BacktestConfig::default().with_min_training_points(1);
    assert!(BacktestHarness::new(model, config).is_err());
}

#[test]
fn test_zero_actuals_leave_mape_undefined() {
    let mut values = vec![5.0; 60];
    values.extend(std::iter::repeat(0.0).take(10));
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let series = PriceSeries::daily(start, values).unwrap();

    let result = run_backtest(&series, 10, &ForecastConfig::default()).unwrap();
    assert_eq!(result.mape(), None);
    assert_eq!(result.accuracy_grade(), None);
    assert_relative_eq!(result.mae().unwrap(), 5.0, max_relative = 1e-9);
}

#[rstest]
#[case(0.5, AccuracyGrade::Excellent)]
#[case(4.99, AccuracyGrade::Excellent)]
#[case(5.0, AccuracyGrade::Good)]
#[case(9.99, AccuracyGrade::Good)]
#[case(10.0, AccuracyGrade::Poor)]
fn test_accuracy_grades(#[case] mape: f64, #[case] grade: AccuracyGrade) {
    assert_eq!(AccuracyGrade::from_mape(mape), grade);
}
