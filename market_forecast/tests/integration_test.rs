use chrono::NaiveDate;
use market_forecast::{
    analyze_symbol, AccuracyGrade, AnalysisConfig, CsvHistorySource, ForecastConfig,
    ForecastError, IndicatorKind,
};
use std::fmt::Write as _;
use std::fs;
use tempfile::tempdir;

/// Two years of weekday closes with a mild trend and a weekly rhythm
fn write_history(dir: &std::path::Path, symbol: &str) -> NaiveDate {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
    let mut last = start;
    for (i, date) in start.iter_days().take(730).enumerate() {
        let weekday = (date - start).num_days() % 7;
        if weekday >= 5 {
            continue;
        }
        let close = 150.0 + 0.08 * i as f64 + [0.0, 0.6, 1.0, 0.4, -0.3][weekday as usize];
        writeln!(
            csv,
            "{},{:.2},{:.2},{:.2},{:.4},1000",
            date,
            close,
            close + 1.0,
            close - 1.0,
            close
        )
        .unwrap();
        last = date;
    }
    fs::write(dir.join(format!("{}.csv", symbol)), csv).unwrap();
    last
}

#[test]
fn test_full_analysis_from_csv() {
    let dir = tempdir().unwrap();
    let end = write_history(dir.path(), "MSFT");
    let source = CsvHistorySource::new(dir.path());

    let config = AnalysisConfig::default()
        .with_horizon_days(90)
        .with_forecast(ForecastConfig::default().with_uncertainty_samples(300));
    let report = analyze_symbol(&source, "MSFT", end, &config).unwrap();

    assert_eq!(report.symbol(), Some("MSFT"));
    assert_eq!(report.summary().latest_date, end);

    let forecast = report.forecast();
    assert_eq!(forecast.len(), 90);
    assert_eq!(forecast.history_end(), end);
    for point in forecast.points() {
        assert!(point.lower_bound <= point.point_estimate);
        assert!(point.point_estimate <= point.upper_bound);
    }

    let indicators = report.indicators();
    for kind in [IndicatorKind::Sma(50), IndicatorKind::Sma(200), IndicatorKind::Rsi(14)] {
        let values = indicators.get(&kind.name()).unwrap();
        assert_eq!(values.len(), indicators.dates().len());
        assert!(values.last().unwrap().is_some());
    }

    let backtest = report.backtest().unwrap();
    assert_eq!(backtest.held_out().len(), 90);
    assert!(backtest.mape().unwrap() < 5.0);
    assert_eq!(backtest.accuracy_grade(), Some(AccuracyGrade::Excellent));
    let coverage = backtest.coverage().unwrap();
    assert!((0.0..=1.0).contains(&coverage));

    let json = report.to_json().unwrap();
    assert!(json.contains("\"SMA_200\""));
}

#[test]
fn test_missing_symbol_surfaces_source_error() {
    let dir = tempdir().unwrap();
    let source = CsvHistorySource::new(dir.path());
    let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let err = analyze_symbol(&source, "GHOST", end, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, ForecastError::SymbolNotFound { .. }));
    assert_eq!(err.code(), "symbol_not_found");
}
