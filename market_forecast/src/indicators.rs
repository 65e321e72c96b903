//! Technical indicators over price series
//!
//! The streaming calculators live in `trade_math`; this module validates
//! windows against the series and keeps every output aligned to the source
//! dates.

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trade_math::{moving_averages, oscillators, IndicatorKind};

/// Stateless entry point for indicator calculations
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    fn check_window(series: &PriceSeries, window: usize) -> Result<()> {
        if series.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if window == 0 || window > series.len() {
            return Err(ForecastError::invalid(
                "window",
                format!(
                    "must be between 1 and the series length {}, got {}",
                    series.len(),
                    window
                ),
            ));
        }
        Ok(())
    }

    /// Trailing simple moving average; `None` until `window` values are seen
    pub fn compute_sma(series: &PriceSeries, window: usize) -> Result<Vec<Option<f64>>> {
        Self::check_window(series, window)?;
        Ok(moving_averages::sma(&series.values(), window)?)
    }

    /// Wilder RSI in `[0, 100]`; `None` for the first `window` points
    pub fn compute_rsi(series: &PriceSeries, window: usize) -> Result<Vec<Option<f64>>> {
        Self::check_window(series, window)?;
        Ok(oscillators::rsi(&series.values(), window)?)
    }

    pub fn compute(series: &PriceSeries, kind: IndicatorKind) -> Result<Vec<Option<f64>>> {
        match kind {
            IndicatorKind::Sma(window) => Self::compute_sma(series, window),
            IndicatorKind::Rsi(window) => Self::compute_rsi(series, window),
        }
    }
}

/// Indicator values keyed by name (`"SMA_50"`, `"RSI_14"`, ...), each aligned
/// to `dates`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    dates: Vec<NaiveDate>,
    values: BTreeMap<String, Vec<Option<f64>>>,
}

impl IndicatorSet {
    /// Compute every requested indicator over the series
    pub fn compute(series: &PriceSeries, kinds: &[IndicatorKind]) -> Result<Self> {
        let mut values = BTreeMap::new();
        for &kind in kinds {
            values.insert(kind.name(), IndicatorEngine::compute(series, kind)?);
        }
        Ok(Self {
            dates: series.dates(),
            values,
        })
    }

    /// Dates every indicator sequence is aligned to
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Most recent value of an indicator, if its window has filled
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.last().copied().flatten())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
