//! # Trade Math
//!
//! Mathematical calculations for technical indicators.
//! This crate provides streaming implementations of the moving averages and
//! oscillators drawn on the price charts, plus whole-series helpers that align
//! indicator output with the input prices.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// Indicator modules
pub mod moving_averages;
pub mod oscillators;

/// Errors that can occur in indicator calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: need {required} values, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// An indicator together with its window length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    /// Simple moving average over `n` observations
    Sma(usize),
    /// Wilder's relative strength index over `n` periods
    Rsi(usize),
}

impl IndicatorKind {
    /// Window length of the indicator
    pub fn window(&self) -> usize {
        match self {
            IndicatorKind::Sma(window) | IndicatorKind::Rsi(window) => *window,
        }
    }

    /// Chart label, e.g. `SMA_50` or `RSI_14`
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(window) => write!(f, "SMA_{}", window),
            IndicatorKind::Rsi(window) => write!(f, "RSI_{}", window),
        }
    }
}

/// Run a whole price slice through a streaming indicator.
///
/// Positions where the indicator has not warmed up yet are `None`, so the
/// output always has the same length as `prices`.
pub fn aligned<F>(prices: &[f64], mut step: F) -> Result<Vec<Option<f64>>>
where
    F: FnMut(f64) -> Result<Option<f64>>,
{
    prices.iter().map(|&price| step(price)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_names() {
        assert_eq!(IndicatorKind::Sma(50).name(), "SMA_50");
        assert_eq!(IndicatorKind::Sma(200).name(), "SMA_200");
        assert_eq!(IndicatorKind::Rsi(14).name(), "RSI_14");
        assert_eq!(IndicatorKind::Rsi(14).window(), 14);
    }

    #[test]
    fn test_indicator_kind_serde() {
        let json = serde_json::to_string(&IndicatorKind::Sma(50)).unwrap();
        assert_eq!(json, r#"{"sma":50}"#);

        let kind: IndicatorKind = serde_json::from_str(r#"{"rsi":14}"#).unwrap();
        assert_eq!(kind, IndicatorKind::Rsi(14));
    }

    #[test]
    fn test_aligned_preserves_length() {
        let prices = [1.0, 2.0, 3.0];
        let mut seen = 0;
        let out = aligned(&prices, |p| {
            seen += 1;
            Ok(if seen > 1 { Some(p) } else { None })
        })
        .unwrap();
        assert_eq!(out, vec![None, Some(2.0), Some(3.0)]);
    }
}
