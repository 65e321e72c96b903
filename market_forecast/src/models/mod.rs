//! Forecasting models for price series

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Forecast for a single future date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Trend component of the point estimate
    pub trend: f64,
}

impl ForecastPoint {
    /// Distance between the interval bounds
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }

    /// Whether `value` lies inside the interval, bounds included
    pub fn contains(&self, value: f64) -> bool {
        self.lower_bound <= value && value <= self.upper_bound
    }
}

/// Direction of the forecast relative to the latest observed price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Bullish,
    Bearish,
}

/// Forecast result containing predicted values and their intervals
///
/// Deserialization runs through the same checks as [`ForecastResult::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawForecastResult")]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
    /// Last observed date of the series the model was fitted on
    history_end: NaiveDate,
    /// Probability mass the intervals were built for
    interval_width: f64,
}

#[derive(Deserialize)]
struct RawForecastResult {
    points: Vec<ForecastPoint>,
    history_end: NaiveDate,
    interval_width: f64,
}

impl TryFrom<RawForecastResult> for ForecastResult {
    type Error = ForecastError;

    fn try_from(raw: RawForecastResult) -> Result<Self> {
        ForecastResult::new(raw.points, raw.history_end, raw.interval_width)
    }
}

impl ForecastResult {
    /// Create a new forecast result, checking ordering and interval bounds
    pub fn new(
        points: Vec<ForecastPoint>,
        history_end: NaiveDate,
        interval_width: f64,
    ) -> Result<Self> {
        for (i, point) in points.iter().enumerate() {
            let finite = point.point_estimate.is_finite()
                && point.lower_bound.is_finite()
                && point.upper_bound.is_finite();
            let ordered = point.lower_bound <= point.point_estimate
                && point.point_estimate <= point.upper_bound;
            if !finite || !ordered {
                return Err(ForecastError::invalid(
                    "forecast",
                    format!(
                        "point {} violates lower <= estimate <= upper ({}, {}, {})",
                        i, point.lower_bound, point.point_estimate, point.upper_bound
                    ),
                ));
            }
            if i > 0 && point.date <= points[i - 1].date {
                return Err(ForecastError::invalid(
                    "forecast",
                    format!("dates must be strictly increasing at point {}", i),
                ));
            }
        }

        Ok(Self {
            points,
            history_end,
            interval_width,
        })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn history_end(&self) -> NaiveDate {
        self.history_end
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Get the point estimates
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.point_estimate).collect()
    }

    /// Get the `(lower, upper)` interval bounds
    pub fn intervals(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.lower_bound, p.upper_bound))
            .collect()
    }

    /// Final point of the forecast
    pub fn last(&self) -> Option<&ForecastPoint> {
        self.points.last()
    }

    /// Bullish when the final estimate ends above `current_price`
    pub fn direction(&self, current_price: f64) -> Option<TrendDirection> {
        self.last().map(|p| {
            if p.point_estimate > current_price {
                TrendDirection::Bullish
            } else {
                TrendDirection::Bearish
            }
        })
    }

    /// Serialize the forecast as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Forecast model that can be fitted to a price series
pub trait ForecastModel: Debug {
    /// Fitted state produced by [`ForecastModel::fit`]
    type Params: Debug + Clone;

    /// Fit the model to a price series
    fn fit(&self, series: &PriceSeries) -> Result<Self::Params>;

    /// Forecast `horizon` days past the end of the fitted history
    fn predict(&self, params: &Self::Params, horizon: usize) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

pub mod additive;
pub mod seasonality;
mod solver;
pub mod trend;
mod uncertainty;

pub use additive::{fit, predict, AdditiveModel, ModelParameters};
pub use seasonality::SeasonalComponent;
pub use trend::TrendComponent;
