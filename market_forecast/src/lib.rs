//! # Market Forecast
//!
//! Price forecasting for daily closing prices.
//!
//! ## Features
//!
//! - Validated, immutable price series with headline summaries
//! - Additive trend + seasonality model with changepoints, logistic growth
//!   and simulated uncertainty intervals
//! - Reality-check backtesting over a held-out trailing window
//! - SMA and RSI indicators aligned to the source dates
//! - A serializable report bundling all of the above
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use market_forecast::config::ForecastConfig;
//! use market_forecast::data::PriceSeries;
//! use market_forecast::models::{fit, predict};
//!
//! let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
//! let values: Vec<f64> = (0..120).map(|i| 100.0 + 0.5 * i as f64).collect();
//! let series = PriceSeries::daily(start, values)?;
//!
//! let params = fit(&series, &ForecastConfig::default())?;
//! let forecast = predict(&params, 30)?;
//!
//! assert_eq!(forecast.len(), 30);
//! assert!(forecast.points().iter().all(|p| p.lower_bound <= p.upper_bound));
//! # Ok::<(), market_forecast::ForecastError>(())
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod models;
pub mod report;
pub mod source;
pub mod utils;

// Re-export commonly used types
pub use crate::backtest::{run_backtest, AccuracyGrade, BacktestHarness, BacktestResult};
pub use crate::config::{AnalysisConfig, BacktestConfig, ForecastConfig, IndicatorConfig};
pub use crate::data::{PricePoint, PriceSeries, PriceSummary};
pub use crate::error::{ForecastError, Result};
pub use crate::indicators::{IndicatorEngine, IndicatorSet};
pub use crate::models::{AdditiveModel, ForecastModel, ForecastResult, ModelParameters};
pub use crate::report::{analyze, analyze_symbol, ForecastReport};
pub use crate::source::{CsvHistorySource, HistorySource, InMemoryHistorySource};
pub use trade_math::IndicatorKind;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
