use chrono::NaiveDate;
use market_forecast::data::{PricePoint, PriceSeries};
use market_forecast::error::{ForecastError, SeriesViolation};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[fixture]
fn series() -> PriceSeries {
    let dates = vec![
        date("2023-01-02"),
        date("2023-01-03"),
        date("2023-01-04"),
        date("2023-01-06"),
        date("2023-01-09"),
    ];
    let values = vec![100.0, 102.0, 104.0, 103.0, 105.0];
    PriceSeries::from_parts(dates, values).unwrap()
}

#[rstest]
fn test_series_accessors(series: PriceSeries) {
    assert_eq!(series.len(), 5);
    assert!(!series.is_empty());
    assert_eq!(series.first_date(), Some(date("2023-01-02")));
    assert_eq!(series.last_date(), Some(date("2023-01-09")));
    assert_eq!(series.span_days(), 7);
    assert_eq!(series.values(), vec![100.0, 102.0, 104.0, 103.0, 105.0]);
    assert_eq!(series.symbol(), None);
}

#[rstest]
fn test_slicing_returns_new_series(series: PriceSeries) {
    let head = series.head(2).unwrap();
    assert_eq!(head.values(), vec![100.0, 102.0]);

    let tail = series.tail(2).unwrap();
    assert_eq!(tail.dates(), vec![date("2023-01-06"), date("2023-01-09")]);

    let middle = series.slice(1, Some(4)).unwrap();
    assert_eq!(middle.values(), vec![102.0, 104.0, 103.0]);

    // Source series is untouched
    assert_eq!(series.len(), 5);

    assert!(series.slice(3, Some(2)).is_err());
    assert!(series.tail(6).is_err());
}

#[rstest]
fn test_summary(series: PriceSeries) {
    let summary = series.summary().unwrap();
    assert_eq!(summary.latest_date, date("2023-01-09"));
    assert_eq!(summary.latest_price, 105.0);
    assert_eq!(summary.previous_price, Some(103.0));
    assert_eq!(summary.change, Some(2.0));
    assert!((summary.change_pct.unwrap() - 2.0 / 103.0 * 100.0).abs() < 1e-12);
    assert_eq!(summary.period_high, 105.0);
    assert_eq!(summary.period_low, 100.0);
}

#[test]
fn test_summary_of_single_point() {
    let series = PriceSeries::daily(date("2023-01-01"), vec![42.0]).unwrap();
    let summary = series.summary().unwrap();
    assert_eq!(summary.previous_price, None);
    assert_eq!(summary.change_pct, None);
}

#[test]
fn test_summary_of_empty_series() {
    let empty = PriceSeries::new(Vec::new()).unwrap();
    assert!(matches!(
        empty.summary(),
        Err(ForecastError::InsufficientData { required: 1, actual: 0 })
    ));
}

#[rstest]
#[case(vec![1.0, f64::NAN, 3.0], 1, SeriesViolation::NonFiniteValue)]
#[case(vec![1.0, 2.0, -0.5], 2, SeriesViolation::NegativeValue)]
#[case(vec![f64::INFINITY], 0, SeriesViolation::NonFiniteValue)]
fn test_invalid_values_rejected(
    #[case] values: Vec<f64>,
    #[case] bad_index: usize,
    #[case] expected: SeriesViolation,
) {
    let err = PriceSeries::daily(date("2023-01-01"), values).unwrap_err();
    match err {
        ForecastError::InvalidSeries { index, violation } => {
            assert_eq!(index, bad_index);
            assert_eq!(violation, expected);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_dates_must_increase() {
    let duplicate = vec![
        PricePoint::new(date("2023-01-01"), 1.0),
        PricePoint::new(date("2023-01-01"), 2.0),
    ];
    assert!(matches!(
        PriceSeries::new(duplicate),
        Err(ForecastError::InvalidSeries {
            index: 1,
            violation: SeriesViolation::NonIncreasingTimestamp
        })
    ));

    let backwards = vec![
        PricePoint::new(date("2023-01-02"), 1.0),
        PricePoint::new(date("2023-01-01"), 2.0),
    ];
    assert!(PriceSeries::new(backwards).is_err());
}

#[test]
fn test_length_mismatch() {
    let err = PriceSeries::from_parts(vec![date("2023-01-01")], vec![1.0, 2.0]).unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InvalidSeries {
            violation: SeriesViolation::LengthMismatch,
            ..
        }
    ));
}

#[test]
fn test_zero_prices_allowed() {
    let series = PriceSeries::daily(date("2023-01-01"), vec![0.0, 0.0, 1.0]).unwrap();
    assert_eq!(series.len(), 3);
}

#[rstest]
fn test_deserialization_validates(series: PriceSeries) {
    let json = serde_json::to_string(&series.clone().with_symbol("ACME")).unwrap();
    let back: PriceSeries = serde_json::from_str(&json).unwrap();
    assert_eq!(back.symbol(), Some("ACME"));
    assert_eq!(back.points(), series.points());

    let unordered = r#"{"points":[
        {"date":"2023-01-02","value":1.0},
        {"date":"2023-01-01","value":2.0}
    ]}"#;
    assert!(serde_json::from_str::<PriceSeries>(unordered).is_err());

    let negative = r#"{"points":[{"date":"2023-01-01","value":-1.0}]}"#;
    assert!(serde_json::from_str::<PriceSeries>(negative).is_err());
}
