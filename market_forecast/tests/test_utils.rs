use chrono::NaiveDate;
use market_forecast::data::PriceSeries;
use market_forecast::error::ForecastError;
use market_forecast::utils::{future_dates, percent_change, split_holdout};

#[test]
fn test_future_dates_are_consecutive_days() {
    let last = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
    let dates = future_dates(last, 4);
    let expected: Vec<NaiveDate> = ["2024-02-28", "2024-02-29", "2024-03-01", "2024-03-02"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    assert_eq!(dates, expected);
    assert!(future_dates(last, 0).is_empty());
}

#[test]
fn test_split_holdout() {
    let series = PriceSeries::daily(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        vec![1.0, 2.0, 3.0, 4.0, 5.0],
    )
    .unwrap();

    let (train, test) = split_holdout(&series, 2).unwrap();
    assert_eq!(train.values(), vec![1.0, 2.0, 3.0]);
    assert_eq!(test.values(), vec![4.0, 5.0]);

    for holdout in [0, 5, 6] {
        assert!(matches!(
            split_holdout(&series, holdout),
            Err(ForecastError::InvalidParameter { parameter: "holdout", .. })
        ));
    }
}

#[test]
fn test_percent_change() {
    assert_eq!(percent_change(50.0, 55.0), Some(10.0));
    assert_eq!(percent_change(0.0, 5.0), None);
}
