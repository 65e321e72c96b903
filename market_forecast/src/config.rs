//! Configuration for fitting, backtesting and report assembly
//!
//! All structs deserialize with defaults for missing fields, so a JSON file
//! only needs to list what it overrides.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trade_math::IndicatorKind;

/// Seed used for interval simulation when none is configured
pub const DEFAULT_SEED: u64 = 42;

/// Shortest forecast horizon offered to users
pub const MIN_HORIZON_DAYS: usize = 30;

/// Longest forecast horizon offered to users
pub const MAX_HORIZON_DAYS: usize = 365;

/// Trend shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Growth {
    /// Piecewise-linear trend
    #[default]
    Linear,
    /// Logistic growth saturating at `cap`
    Logistic { cap: f64 },
}

/// How seasonal terms combine with the trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalityMode {
    /// `y = trend + seasonal`
    #[default]
    Additive,
    /// `y = trend * (1 + seasonal)`
    Multiplicative,
}

/// Whether a seasonal component is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalitySetting {
    /// Enable when the history supports it
    #[default]
    Auto,
    Disabled,
    /// Enable with the given Fourier order
    Fourier(usize),
}

/// Forecast model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub growth: Growth,
    /// Number of potential changepoints when none are given explicitly
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints are placed
    pub changepoint_range: f64,
    /// Explicit changepoint dates, overriding `n_changepoints`
    pub changepoints: Option<Vec<NaiveDate>>,
    /// Laplace prior scale on trend changes ("trend sensitivity")
    pub changepoint_prior_scale: f64,
    /// Gaussian prior scale on seasonal coefficients
    pub seasonality_prior_scale: f64,
    pub seasonality_mode: SeasonalityMode,
    pub weekly_seasonality: SeasonalitySetting,
    pub yearly_seasonality: SeasonalitySetting,
    /// Probability mass inside the reported interval
    pub interval_width: f64,
    /// Monte-Carlo draws for interval estimation; 0 uses the noise term only
    pub uncertainty_samples: usize,
    pub seed: u64,
    /// Coordinate descent sweep limit per solve
    pub max_iterations: usize,
    /// Largest coefficient change that counts as converged
    pub tolerance: f64,
    /// Wall-clock budget for `fit`, in milliseconds
    pub fit_budget_ms: Option<u64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            growth: Growth::Linear,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoints: None,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            seasonality_mode: SeasonalityMode::Additive,
            weekly_seasonality: SeasonalitySetting::Auto,
            yearly_seasonality: SeasonalitySetting::Auto,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: DEFAULT_SEED,
            max_iterations: 2000,
            tolerance: 1e-9,
            fit_budget_ms: None,
        }
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ForecastError::invalid(
            parameter,
            format!("must be a positive finite number, got {}", value),
        ))
    }
}

impl ForecastConfig {
    pub fn with_growth(mut self, growth: Growth) -> Self {
        self.growth = growth;
        self
    }

    pub fn with_n_changepoints(mut self, n: usize) -> Self {
        self.n_changepoints = n;
        self
    }

    pub fn with_changepoints(mut self, dates: Vec<NaiveDate>) -> Self {
        self.changepoints = Some(dates);
        self
    }

    pub fn with_changepoint_prior_scale(mut self, scale: f64) -> Self {
        self.changepoint_prior_scale = scale;
        self
    }

    pub fn with_seasonality_prior_scale(mut self, scale: f64) -> Self {
        self.seasonality_prior_scale = scale;
        self
    }

    pub fn with_seasonality_mode(mut self, mode: SeasonalityMode) -> Self {
        self.seasonality_mode = mode;
        self
    }

    pub fn with_weekly_seasonality(mut self, setting: SeasonalitySetting) -> Self {
        self.weekly_seasonality = setting;
        self
    }

    pub fn with_yearly_seasonality(mut self, setting: SeasonalitySetting) -> Self {
        self.yearly_seasonality = setting;
        self
    }

    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    pub fn with_uncertainty_samples(mut self, samples: usize) -> Self {
        self.uncertainty_samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_fit_budget_ms(mut self, budget_ms: u64) -> Self {
        self.fit_budget_ms = Some(budget_ms);
        self
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<()> {
        if let Growth::Logistic { cap } = self.growth {
            positive("cap", cap)?;
        }

        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::invalid(
                "changepoint_range",
                format!("must be in (0, 1], got {}", self.changepoint_range),
            ));
        }
        positive("changepoint_prior_scale", self.changepoint_prior_scale)?;
        positive("seasonality_prior_scale", self.seasonality_prior_scale)?;

        for (parameter, setting) in [
            ("weekly_seasonality", self.weekly_seasonality),
            ("yearly_seasonality", self.yearly_seasonality),
        ] {
            if setting == SeasonalitySetting::Fourier(0) {
                return Err(ForecastError::invalid(
                    parameter,
                    "Fourier order must be positive",
                ));
            }
        }

        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::invalid(
                "interval_width",
                format!("must be in (0, 1), got {}", self.interval_width),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ForecastError::invalid(
                "max_iterations",
                "must be greater than zero",
            ));
        }
        positive("tolerance", self.tolerance)?;
        if self.fit_budget_ms == Some(0) {
            return Err(ForecastError::invalid(
                "fit_budget_ms",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

/// Reality-check configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Smallest training window the harness will fit on
    pub min_training_points: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            min_training_points: 30,
        }
    }
}

impl BacktestConfig {
    pub fn with_min_training_points(mut self, n: usize) -> Self {
        self.min_training_points = n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_training_points < 2 {
            return Err(ForecastError::invalid(
                "min_training_points",
                format!("must be at least 2, got {}", self.min_training_points),
            ));
        }
        Ok(())
    }
}

/// Which indicators go into a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub indicators: Vec<IndicatorKind>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            indicators: vec![
                IndicatorKind::Sma(50),
                IndicatorKind::Sma(200),
                IndicatorKind::Rsi(14),
            ],
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(kind) = self.indicators.iter().find(|k| k.window() == 0) {
            return Err(ForecastError::invalid(
                "window",
                format!("{:?} has a zero window", kind),
            ));
        }
        Ok(())
    }
}

/// End-to-end analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Days to forecast past the last observation
    pub horizon_days: usize,
    /// Years of history requested from the data source
    pub lookback_years: u32,
    pub run_backtest: bool,
    /// Days withheld by the reality check; defaults to the horizon
    pub holdout_days: Option<usize>,
    pub forecast: ForecastConfig,
    pub backtest: BacktestConfig,
    pub indicators: IndicatorConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            horizon_days: 90,
            lookback_years: 2,
            run_backtest: true,
            holdout_days: None,
            forecast: ForecastConfig::default(),
            backtest: BacktestConfig::default(),
            indicators: IndicatorConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_horizon_days(mut self, days: usize) -> Self {
        self.horizon_days = days;
        self
    }

    pub fn with_holdout_days(mut self, days: usize) -> Self {
        self.holdout_days = Some(days);
        self
    }

    pub fn with_backtest(mut self, enabled: bool) -> Self {
        self.run_backtest = enabled;
        self
    }

    pub fn with_forecast(mut self, forecast: ForecastConfig) -> Self {
        self.forecast = forecast;
        self
    }

    pub fn with_indicators(mut self, indicators: Vec<IndicatorKind>) -> Self {
        self.indicators = IndicatorConfig { indicators };
        self
    }

    /// Days the reality check withholds
    pub fn effective_holdout(&self) -> usize {
        self.holdout_days.unwrap_or(self.horizon_days)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&self.horizon_days) {
            return Err(ForecastError::invalid(
                "horizon_days",
                format!(
                    "must be between {} and {}, got {}",
                    MIN_HORIZON_DAYS, MAX_HORIZON_DAYS, self.horizon_days
                ),
            ));
        }
        if !(1..=5).contains(&self.lookback_years) {
            return Err(ForecastError::invalid(
                "lookback_years",
                format!("must be between 1 and 5, got {}", self.lookback_years),
            ));
        }
        if self.holdout_days == Some(0) {
            return Err(ForecastError::invalid(
                "holdout_days",
                "must be greater than zero",
            ));
        }

        self.forecast.validate()?;
        self.backtest.validate()?;
        self.indicators.validate()
    }
}
