//! Price series handling for forecasting

use crate::error::{ForecastError, Result, SeriesViolation};
use crate::utils::percent_change;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dated observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Observation date
    pub date: NaiveDate,
    /// Closing price
    pub value: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Immutable, validated price history for one instrument
///
/// Dates are strictly increasing and values are finite and non-negative.
/// Gaps between dates are allowed (weekends, holidays). Deserialization runs
/// through the same validation as [`PriceSeries::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceSeries")]
pub struct PriceSeries {
    symbol: Option<String>,
    points: Vec<PricePoint>,
}

#[derive(Deserialize)]
struct RawPriceSeries {
    #[serde(default)]
    symbol: Option<String>,
    points: Vec<PricePoint>,
}

impl TryFrom<RawPriceSeries> for PriceSeries {
    type Error = ForecastError;

    fn try_from(raw: RawPriceSeries) -> Result<Self> {
        let series = PriceSeries::new(raw.points)?;
        Ok(match raw.symbol {
            Some(symbol) => series.with_symbol(symbol),
            None => series,
        })
    }
}

/// Headline numbers for the latest observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub latest_date: NaiveDate,
    pub latest_price: f64,
    pub previous_price: Option<f64>,
    /// Absolute change from the previous observation
    pub change: Option<f64>,
    /// Percent change from the previous observation
    pub change_pct: Option<f64>,
    /// Highest value over the series
    pub period_high: f64,
    /// Lowest value over the series
    pub period_low: f64,
}

/// Check ordering and positivity of raw observations
pub fn validate_points(points: &[PricePoint]) -> Result<()> {
    for (index, point) in points.iter().enumerate() {
        if !point.value.is_finite() {
            return Err(ForecastError::InvalidSeries {
                index,
                violation: SeriesViolation::NonFiniteValue,
            });
        }
        if point.value < 0.0 {
            return Err(ForecastError::InvalidSeries {
                index,
                violation: SeriesViolation::NegativeValue,
            });
        }
        if index > 0 && point.date <= points[index - 1].date {
            return Err(ForecastError::InvalidSeries {
                index,
                violation: SeriesViolation::NonIncreasingTimestamp,
            });
        }
    }
    Ok(())
}

impl PriceSeries {
    /// Create a series from observations, validating them
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        validate_points(&points)?;
        Ok(Self {
            symbol: None,
            points,
        })
    }

    /// Create a series from parallel date and value vectors
    pub fn from_parts(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::InvalidSeries {
                index: dates.len().min(values.len()),
                violation: SeriesViolation::LengthMismatch,
            });
        }

        let points = dates
            .into_iter()
            .zip(values)
            .map(|(date, value)| PricePoint { date, value })
            .collect();
        Self::new(points)
    }

    /// Create a series with one observation per calendar day from `start`
    pub fn daily(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let dates = start.iter_days().take(values.len()).collect();
        Self::from_parts(dates, values)
    }

    /// Tag the series with an instrument symbol
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Re-check the invariants, for series handed over by an untrusted source
    pub fn validate(&self) -> Result<()> {
        validate_points(&self.points)
    }

    /// Instrument symbol, if known
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// All observations in order
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Observation dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Observation values in order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last().map(|p| p.date)
    }

    /// Calendar days between the first and last observation
    pub fn span_days(&self) -> i64 {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => 0,
        }
    }

    /// Get a slice of the series from start to end index
    pub fn slice(&self, start: usize, end: Option<usize>) -> Result<Self> {
        let end = end.unwrap_or(self.points.len());
        if start > end || end > self.points.len() {
            return Err(ForecastError::invalid(
                "range",
                format!(
                    "slice {}..{} out of bounds for series of length {}",
                    start,
                    end,
                    self.points.len()
                ),
            ));
        }

        Ok(Self {
            symbol: self.symbol.clone(),
            points: self.points[start..end].to_vec(),
        })
    }

    /// The first `n` observations
    pub fn head(&self, n: usize) -> Result<Self> {
        self.slice(0, Some(n))
    }

    /// The last `n` observations
    pub fn tail(&self, n: usize) -> Result<Self> {
        let len = self.points.len();
        if n > len {
            return Err(ForecastError::invalid(
                "n",
                format!("tail of {} requested from series of length {}", n, len),
            ));
        }
        self.slice(len - n, None)
    }

    /// Latest price, day-over-day change and the period range
    pub fn summary(&self) -> Result<PriceSummary> {
        let latest = self.last().ok_or(ForecastError::InsufficientData {
            required: 1,
            actual: 0,
        })?;
        let previous_price = self
            .points
            .len()
            .checked_sub(2)
            .map(|i| self.points[i].value);
        let change = previous_price.map(|prev| latest.value - prev);
        let change_pct = previous_price.and_then(|prev| percent_change(prev, latest.value));

        let (period_low, period_high) = self
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.value), hi.max(p.value))
            });

        Ok(PriceSummary {
            latest_date: latest.date,
            latest_price: latest.value,
            previous_price,
            change,
            change_pct,
            period_high,
            period_low,
        })
    }
}
