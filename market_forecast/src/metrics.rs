//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use crate::models::ForecastResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAE: &str = "mae";
pub const MAPE: &str = "mape";
pub const RMSE: &str = "rmse";
pub const COVERAGE: &str = "coverage";

fn check_lengths(actual_len: usize, predicted_len: usize) -> Result<()> {
    if actual_len == 0 {
        return Err(ForecastError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    if actual_len != predicted_len {
        return Err(ForecastError::invalid(
            "predicted",
            format!(
                "expected {} predictions to match the actual values, got {}",
                actual_len, predicted_len
            ),
        ));
    }
    Ok(())
}

/// Mean absolute error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual.len(), predicted.len())?;
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(total / actual.len() as f64)
}

/// Mean absolute percentage error, in percent, over the non-zero actuals
///
/// Returns `None` when every actual value is zero.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<Option<f64>> {
    check_lengths(actual.len(), predicted.len())?;
    let (total, count) = actual
        .iter()
        .zip(predicted)
        .filter(|(&a, _)| a != 0.0)
        .fold((0.0, 0usize), |(total, count), (a, p)| {
            (total + ((a - p) / a).abs(), count + 1)
        });

    if count == 0 {
        Ok(None)
    } else {
        Ok(Some(total / count as f64 * 100.0))
    }
}

/// Root mean squared error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual.len(), predicted.len())?;
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok((total / actual.len() as f64).sqrt())
}

/// Fraction of actual values inside the forecast interval at the same position
pub fn coverage(actual: &[f64], forecast: &ForecastResult) -> Result<f64> {
    check_lengths(actual.len(), forecast.len())?;
    let inside = actual
        .iter()
        .zip(forecast.points())
        .filter(|(&a, point)| point.contains(a))
        .count();
    Ok(inside as f64 / actual.len() as f64)
}

/// Forecast performance metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Absolute Percentage Error, absent when every actual is zero
    pub mape: Option<f64>,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Share of actuals inside the interval, in `[0, 1]`
    pub coverage: f64,
}

impl ForecastMetrics {
    /// Evaluate a forecast against the values it tried to predict
    pub fn evaluate(actual: &[f64], forecast: &ForecastResult) -> Result<Self> {
        let predicted = forecast.values();
        Ok(Self {
            mae: mean_absolute_error(actual, &predicted)?,
            mape: mean_absolute_percentage_error(actual, &predicted)?,
            rmse: root_mean_squared_error(actual, &predicted)?,
            coverage: coverage(actual, forecast)?,
        })
    }

    /// Metrics keyed by name; `mape` is left out when undefined
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert(MAE.to_string(), self.mae);
        if let Some(mape) = self.mape {
            map.insert(MAPE.to_string(), mape);
        }
        map.insert(RMSE.to_string(), self.rmse);
        map.insert(COVERAGE.to_string(), self.coverage);
        map
    }
}

impl std::fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Performance Metrics:")?;
        writeln!(f, "  MAE:      {:.4}", self.mae)?;
        match self.mape {
            Some(mape) => writeln!(f, "  MAPE:     {:.4}%", mape)?,
            None => writeln!(f, "  MAPE:     n/a")?,
        }
        writeln!(f, "  RMSE:     {:.4}", self.rmse)?;
        writeln!(f, "  Coverage: {:.2}%", self.coverage * 100.0)?;
        Ok(())
    }
}
