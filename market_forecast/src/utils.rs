//! Utility functions for the market_forecast crate

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};

/// Split a series into a training prefix and a held-out tail of `holdout`
/// observations
pub fn split_holdout(series: &PriceSeries, holdout: usize) -> Result<(PriceSeries, PriceSeries)> {
    if holdout == 0 || holdout >= series.len() {
        return Err(ForecastError::invalid(
            "holdout",
            format!(
                "must be between 1 and {} for a series of {} points, got {}",
                series.len().saturating_sub(1),
                series.len(),
                holdout
            ),
        ));
    }

    let split = series.len() - holdout;
    Ok((series.head(split)?, series.tail(holdout)?))
}

/// Consecutive calendar days following `last_date`
pub fn future_dates(last_date: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64)
        .map(|offset| last_date + Duration::days(offset))
        .collect()
}

/// Percent change from `from` to `to`, `None` when `from` is zero
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        None
    } else {
        Some((to - from) / from * 100.0)
    }
}
