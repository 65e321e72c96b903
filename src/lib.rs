//! # Market Minds
//!
//! `market_minds` ties together the workspace crates: `trade_math` for the
//! streaming indicator calculators and `market_forecast` for the forecasting
//! model, reality check and report.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use market_minds::{analyze, AnalysisConfig, PriceSeries};
//!
//! let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
//! let values: Vec<f64> = (0..400).map(|i| 50.0 + 0.1 * i as f64).collect();
//! let series = PriceSeries::daily(start, values).unwrap().with_symbol("DEMO");
//!
//! let config = AnalysisConfig::default().with_horizon_days(30);
//! let report = analyze(&series, &config).unwrap();
//!
//! assert_eq!(report.symbol(), Some("DEMO"));
//! assert_eq!(report.forecast().len(), 30);
//! assert!(report.indicators().latest("SMA_50").is_some());
//! ```

pub use market_forecast::{
    analyze, analyze_symbol, run_backtest, AccuracyGrade, AnalysisConfig, BacktestResult,
    CsvHistorySource, ForecastConfig, ForecastError, ForecastReport, ForecastResult,
    HistorySource, IndicatorKind, IndicatorSet, InMemoryHistorySource, PriceSeries,
};
pub use trade_math::{moving_averages::SimpleMovingAverage, oscillators::RelativeStrengthIndex};

/// Name and version of the forecasting engine
pub fn engine_version() -> String {
    format!("{} {}", market_forecast::NAME, market_forecast::VERSION)
}
