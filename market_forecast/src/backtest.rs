//! Reality check: fit on all but the last `holdout` observations and compare
//! the forecast with what actually happened

use crate::config::{BacktestConfig, ForecastConfig};
use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::metrics::{self, ForecastMetrics};
use crate::models::{AdditiveModel, ForecastModel, ForecastResult};
use crate::utils::split_holdout;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse label for backtest accuracy
///
/// Diagnostic only: below 5% MAPE is excellent, below 10% good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyGrade {
    Excellent,
    Good,
    Poor,
}

impl AccuracyGrade {
    pub fn from_mape(mape: f64) -> Self {
        if mape < 5.0 {
            AccuracyGrade::Excellent
        } else if mape < 10.0 {
            AccuracyGrade::Good
        } else {
            AccuracyGrade::Poor
        }
    }
}

impl fmt::Display for AccuracyGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccuracyGrade::Excellent => "Excellent",
            AccuracyGrade::Good => "Good",
            AccuracyGrade::Poor => "Poor",
        };
        f.write_str(label)
    }
}

/// Outcome of one backtest run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    held_out: PriceSeries,
    predicted: ForecastResult,
    error_metrics: BTreeMap<String, f64>,
}

impl BacktestResult {
    /// Actual observations the model did not see
    pub fn held_out(&self) -> &PriceSeries {
        &self.held_out
    }

    /// Forecast for the held-out window, aligned by position
    pub fn predicted(&self) -> &ForecastResult {
        &self.predicted
    }

    /// `mae`, `rmse`, `coverage` and, when defined, `mape`
    pub fn error_metrics(&self) -> &BTreeMap<String, f64> {
        &self.error_metrics
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.error_metrics.get(name).copied()
    }

    pub fn mae(&self) -> Option<f64> {
        self.metric(metrics::MAE)
    }

    /// Percent error; `None` when every held-out price is zero
    pub fn mape(&self) -> Option<f64> {
        self.metric(metrics::MAPE)
    }

    pub fn rmse(&self) -> Option<f64> {
        self.metric(metrics::RMSE)
    }

    pub fn coverage(&self) -> Option<f64> {
        self.metric(metrics::COVERAGE)
    }

    pub fn accuracy_grade(&self) -> Option<AccuracyGrade> {
        self.mape().map(AccuracyGrade::from_mape)
    }
}

/// Runs a forecast model over a trailing held-out window
#[derive(Debug, Clone)]
pub struct BacktestHarness<M: ForecastModel> {
    model: M,
    config: BacktestConfig,
}

impl<M: ForecastModel> BacktestHarness<M> {
    pub fn new(model: M, config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Withhold the last `holdout` observations, fit on the rest and score the
    /// forecast against them
    pub fn run(&self, series: &PriceSeries, holdout: usize) -> Result<BacktestResult> {
        let (train, held_out) = split_holdout(series, holdout)?;
        if train.len() < self.config.min_training_points {
            return Err(ForecastError::InsufficientData {
                required: self.config.min_training_points,
                actual: train.len(),
            });
        }

        info!(
            "backtesting {} on {} points, holding out {}",
            self.model.name(),
            train.len(),
            held_out.len()
        );

        let params = self.model.fit(&train)?;
        let predicted = self.model.predict(&params, holdout)?;
        let scores = ForecastMetrics::evaluate(&held_out.values(), &predicted)?;
        info!("backtest finished: mae {:.4}, coverage {:.2}", scores.mae, scores.coverage);

        Ok(BacktestResult {
            held_out,
            predicted,
            error_metrics: scores.to_map(),
        })
    }
}

/// Backtest the additive model with the default harness settings
pub fn run_backtest(
    series: &PriceSeries,
    holdout: usize,
    config: &ForecastConfig,
) -> Result<BacktestResult> {
    let model = AdditiveModel::new(config.clone())?;
    BacktestHarness::new(model, BacktestConfig::default())?.run(series, holdout)
}
