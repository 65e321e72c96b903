//! Error types for the market_forecast crate

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use trade_math::MathError;

/// Why a price series failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesViolation {
    /// Timestamp is not strictly after the previous one
    NonIncreasingTimestamp,
    /// Price is below zero
    NegativeValue,
    /// Price is NaN or infinite
    NonFiniteValue,
    /// Dates and values have different lengths
    LengthMismatch,
}

impl fmt::Display for SeriesViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SeriesViolation::NonIncreasingTimestamp => "non_increasing_timestamp",
            SeriesViolation::NegativeValue => "negative_value",
            SeriesViolation::NonFiniteValue => "non_finite_value",
            SeriesViolation::LengthMismatch => "length_mismatch",
        };
        f.write_str(text)
    }
}

/// Custom error types for the market_forecast crate
///
/// Every variant carries the structured context a presentation layer needs to
/// build its own message; [`ForecastError::code`] gives a stable identifier.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Out-of-range window, horizon, holdout or configuration value
    #[error("invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    /// Series too short for the requested operation
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Aggregated components do not describe the same series
    #[error("inconsistent input in {component}: {reason}")]
    InconsistentInput {
        component: &'static str,
        reason: String,
    },

    /// Fitting exceeded the configured wall-clock budget
    #[error("fit exceeded its budget of {budget_ms} ms")]
    FitTimeout { budget_ms: u64 },

    /// Untrusted series data violates ordering or positivity
    #[error("invalid series at index {index}: {violation}")]
    InvalidSeries {
        index: usize,
        violation: SeriesViolation,
    },

    /// The history source does not know the symbol
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    /// The history source could not be reached or read
    #[error("data source unavailable: {reason}")]
    DataSourceUnavailable { reason: String },

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ForecastError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            ForecastError::InvalidParameter { .. } => "invalid_parameter",
            ForecastError::InsufficientData { .. } => "insufficient_data",
            ForecastError::InconsistentInput { .. } => "inconsistent_input",
            ForecastError::FitTimeout { .. } => "fit_timeout",
            ForecastError::InvalidSeries { .. } => "invalid_series",
            ForecastError::SymbolNotFound { .. } => "symbol_not_found",
            ForecastError::DataSourceUnavailable { .. } => "data_source_unavailable",
            ForecastError::IoError(_) => "io",
            ForecastError::CsvError(_) => "csv",
            ForecastError::SerializationError(_) => "serialization",
        }
    }

    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        ForecastError::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }

    pub(crate) fn inconsistent(component: &'static str, reason: impl Into<String>) -> Self {
        ForecastError::InconsistentInput {
            component,
            reason: reason.into(),
        }
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InsufficientData {
                required,
                available,
            } => ForecastError::InsufficientData {
                required,
                actual: available,
            },
            MathError::InvalidInput(reason) => ForecastError::invalid("indicator", reason),
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
