//! Oscillator indicator implementations
//!
//! Contains the Relative Strength Index (RSI) in Wilder's formulation.

use crate::{aligned, MathError, Result};

/// Relative Strength Index (RSI) implementation
///
/// The first average gain/loss is the simple mean of the first `period`
/// price changes. Every later change is folded in with Wilder smoothing:
/// `avg = (avg * (period - 1) + current) / period`.
#[derive(Debug, Clone)]
pub struct RelativeStrengthIndex {
    period: usize,
    previous_price: Option<f64>,
    seed_gains: Vec<f64>,
    seed_losses: Vec<f64>,
    avg_gain: Option<f64>,
    avg_loss: Option<f64>,
    values_seen: usize,
}

impl RelativeStrengthIndex {
    /// Create a new RSI with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            previous_price: None,
            seed_gains: Vec::with_capacity(period),
            seed_losses: Vec::with_capacity(period),
            avg_gain: None,
            avg_loss: None,
            values_seen: 0,
        })
    }

    /// Update the RSI with a new price value
    pub fn update(&mut self, price: f64) -> Result<()> {
        if !price.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "RSI input must be finite, got {}",
                price
            )));
        }

        self.values_seen += 1;

        if let Some(prev_price) = self.previous_price {
            let change = price - prev_price;
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            match (self.avg_gain, self.avg_loss) {
                (Some(avg_gain), Some(avg_loss)) => {
                    let n = self.period as f64;
                    self.avg_gain = Some((avg_gain * (n - 1.0) + gain) / n);
                    self.avg_loss = Some((avg_loss * (n - 1.0) + loss) / n);
                }
                _ => {
                    self.seed_gains.push(gain);
                    self.seed_losses.push(loss);

                    if self.seed_gains.len() == self.period {
                        let n = self.period as f64;
                        self.avg_gain = Some(self.seed_gains.iter().sum::<f64>() / n);
                        self.avg_loss = Some(self.seed_losses.iter().sum::<f64>() / n);
                        self.seed_gains.clear();
                        self.seed_losses.clear();
                    }
                }
            }
        }

        self.previous_price = Some(price);

        Ok(())
    }

    /// Get the current RSI value (0-100)
    pub fn value(&self) -> Result<f64> {
        match (self.avg_gain, self.avg_loss) {
            (Some(avg_gain), Some(avg_loss)) => {
                if avg_loss == 0.0 {
                    return Ok(100.0); // If no losses, RSI is 100
                }

                let rs = avg_gain / avg_loss;
                let rsi = 100.0 - (100.0 / (1.0 + rs));

                Ok(rsi.clamp(0.0, 100.0))
            }
            _ => Err(MathError::InsufficientData {
                required: self.period + 1,
                available: self.values_seen,
            }),
        }
    }

    /// Whether enough prices have been seen to produce a value
    pub fn is_ready(&self) -> bool {
        self.avg_gain.is_some()
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the RSI, clearing all values
    pub fn reset(&mut self) {
        self.previous_price = None;
        self.seed_gains.clear();
        self.seed_losses.clear();
        self.avg_gain = None;
        self.avg_loss = None;
        self.values_seen = 0;
    }
}

/// RSI of a whole price slice, aligned with the input.
///
/// The first `period` entries are `None`.
pub fn rsi(prices: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut indicator = RelativeStrengthIndex::new(period)?;
    aligned(prices, |price| {
        indicator.update(price)?;
        if indicator.is_ready() {
            indicator.value().map(Some)
        } else {
            Ok(None)
        }
    })
}
