//! Moving average calculation implementations
//!
//! Contains the Simple Moving Average (SMA) used for the 50 and 200 day
//! trend overlays.

use crate::{aligned, MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) implementation
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<f64>,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
        })
    }

    /// Update the SMA with a new value
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "SMA input must be finite, got {}",
                value
            )));
        }

        self.values.push_back(value);

        // Remove oldest value if we have more than period values
        if self.values.len() > self.period {
            self.values.pop_front();
        }

        Ok(())
    }

    /// Get the current SMA value
    pub fn value(&self) -> Result<f64> {
        if self.values.len() < self.period {
            return Err(MathError::InsufficientData {
                required: self.period,
                available: self.values.len(),
            });
        }

        Ok(self.values.iter().sum::<f64>() / self.period as f64)
    }

    /// Whether a full window has been seen
    pub fn is_ready(&self) -> bool {
        self.values.len() >= self.period
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the SMA, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// SMA of a whole price slice, aligned with the input.
///
/// Entry `i` is the mean of `prices[i + 1 - period..=i]` and `None` while
/// `i < period - 1`.
pub fn sma(prices: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut indicator = SimpleMovingAverage::new(period)?;
    aligned(prices, |price| {
        indicator.update(price)?;
        if indicator.is_ready() {
            indicator.value().map(Some)
        } else {
            Ok(None)
        }
    })
}
