use approx::assert_relative_eq;
use chrono::NaiveDate;
use market_forecast::error::ForecastError;
use market_forecast::metrics::{
    coverage, mean_absolute_error, mean_absolute_percentage_error, root_mean_squared_error,
    ForecastMetrics,
};
use market_forecast::models::{ForecastPoint, ForecastResult};

fn forecast(points: &[(f64, f64, f64)]) -> ForecastResult {
    let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
    let points = points
        .iter()
        .enumerate()
        .map(|(i, &(lower, point, upper))| ForecastPoint {
            date: start + chrono::Duration::days(i as i64 + 1),
            point_estimate: point,
            lower_bound: lower,
            upper_bound: upper,
            trend: point,
        })
        .collect();
    ForecastResult::new(points, start, 0.8).unwrap()
}

#[test]
fn test_error_metrics() {
    let actual = [100.0, 110.0, 90.0];
    let predicted = [102.0, 105.0, 90.0];

    assert_relative_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 7.0 / 3.0);
    assert_relative_eq!(
        root_mean_squared_error(&actual, &predicted).unwrap(),
        (29.0_f64 / 3.0).sqrt()
    );
    let mape = mean_absolute_percentage_error(&actual, &predicted)
        .unwrap()
        .unwrap();
    assert_relative_eq!(mape, (2.0 / 100.0 + 5.0 / 110.0) / 3.0 * 100.0, epsilon = 1e-12);
}

#[test]
fn test_mape_skips_zero_actuals() {
    let mape = mean_absolute_percentage_error(&[0.0, 50.0], &[10.0, 45.0])
        .unwrap()
        .unwrap();
    assert_relative_eq!(mape, 10.0, epsilon = 1e-12);

    assert_eq!(mean_absolute_percentage_error(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), None);
}

#[test]
fn test_metric_input_validation() {
    assert!(matches!(
        mean_absolute_error(&[], &[]),
        Err(ForecastError::InsufficientData { .. })
    ));
    assert!(matches!(
        root_mean_squared_error(&[1.0, 2.0], &[1.0]),
        Err(ForecastError::InvalidParameter { .. })
    ));
}

#[test]
fn test_coverage_counts_inclusive_bounds() {
    let result = forecast(&[
        (9.0, 10.0, 11.0),
        (19.0, 20.0, 21.0),
        (29.0, 30.0, 31.0),
        (39.0, 40.0, 41.0),
    ]);
    let actual = [11.0, 25.0, 29.0, 40.0];
    assert_relative_eq!(coverage(&actual, &result).unwrap(), 0.75);
}

#[test]
fn test_forecast_metrics_map_and_display() {
    let result = forecast(&[(90.0, 100.0, 110.0), (95.0, 100.0, 105.0)]);
    let metrics = ForecastMetrics::evaluate(&[100.0, 110.0], &result).unwrap();

    assert_relative_eq!(metrics.mae, 5.0);
    assert_relative_eq!(metrics.coverage, 0.5);

    let map = metrics.to_map();
    let names: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["coverage", "mae", "mape", "rmse"]);

    let text = metrics.to_string();
    assert!(text.contains("MAE:"));
    assert!(text.contains("Coverage: 50.00%"));
}

#[test]
fn test_forecast_result_rejects_bad_intervals() {
    let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
    let point = ForecastPoint {
        date: start + chrono::Duration::days(1),
        point_estimate: 10.0,
        lower_bound: 11.0,
        upper_bound: 12.0,
        trend: 10.0,
    };
    assert!(ForecastResult::new(vec![point], start, 0.8).is_err());
}
