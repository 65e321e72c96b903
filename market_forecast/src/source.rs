//! Sources of historical prices

use crate::data::{PricePoint, PriceSeries};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use log::{debug, info};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Provider of daily closing prices for a symbol
pub trait HistorySource {
    /// Closing prices for `symbol` dated within `start..=end`
    fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries>;
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(ForecastError::invalid(
            "start",
            format!("start {} is after end {}", start, end),
        ));
    }
    Ok(())
}

/// Keep the points dated within `start..=end`
fn within(
    symbol: &str,
    points: &[PricePoint],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries> {
    let selected: Vec<PricePoint> = points
        .iter()
        .filter(|p| p.date >= start && p.date <= end)
        .copied()
        .collect();
    if selected.is_empty() {
        return Err(ForecastError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    Ok(PriceSeries::new(selected)?.with_symbol(symbol))
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

fn parse_date(field: &str) -> Option<NaiveDate> {
    // Timestamps such as "2024-01-02 00:00:00" or RFC 3339 keep their date part
    let date_part = field.split(|c: char| c == ' ' || c == 'T').next().unwrap_or(field);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

fn detect_date_column(headers: &[String]) -> Option<usize> {
    headers.iter().position(|h| {
        let lower = h.to_lowercase();
        lower.contains("date") || lower.contains("time")
    })
}

fn detect_close_column(headers: &[String]) -> Option<usize> {
    let lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    lower
        .iter()
        .position(|h| h.contains("close") && !h.contains("adj"))
        .or_else(|| lower.iter().position(|h| h.contains("close")))
        .or_else(|| lower.iter().position(|h| h.contains("price")))
}

/// Read `(date, close)` pairs from CSV with a header row
///
/// The date column is the first header containing "date" or "time"; the price
/// column is "close" (preferring an unadjusted close), falling back to
/// "price". Rows with an empty or `null` close are skipped. Rows are returned
/// in ascending date order.
pub fn read_price_csv<R: io::Read>(reader: R) -> Result<Vec<PricePoint>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
    let date_col = detect_date_column(&headers).ok_or_else(|| ForecastError::DataSourceUnavailable {
        reason: format!("no date column in headers {:?}", headers),
    })?;
    let close_col =
        detect_close_column(&headers).ok_or_else(|| ForecastError::DataSourceUnavailable {
            reason: format!("no close or price column in headers {:?}", headers),
        })?;

    let mut points = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let date_field = record.get(date_col).unwrap_or_default();
        let close_field = record.get(close_col).unwrap_or_default();

        if close_field.is_empty() || close_field.eq_ignore_ascii_case("null") {
            debug!("skipping row {} with no close price", row + 1);
            continue;
        }

        let date = parse_date(date_field).ok_or_else(|| ForecastError::DataSourceUnavailable {
            reason: format!("row {}: unrecognised date '{}'", row + 1, date_field),
        })?;
        let value: f64 = close_field
            .parse()
            .map_err(|_| ForecastError::DataSourceUnavailable {
                reason: format!("row {}: invalid price '{}'", row + 1, close_field),
            })?;
        points.push(PricePoint::new(date, value));
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}

/// Directory of `<SYMBOL>.csv` files
#[derive(Debug, Clone)]
pub struct CsvHistorySource {
    root: PathBuf,
}

impl CsvHistorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, symbol: &str) -> Result<PathBuf> {
        let valid = !symbol.is_empty()
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
            && !symbol.starts_with('.');
        if !valid {
            return Err(ForecastError::invalid(
                "symbol",
                format!("'{}' is not a valid ticker symbol", symbol),
            ));
        }
        Ok(self.root.join(format!("{}.csv", symbol.to_uppercase())))
    }
}

impl HistorySource for CsvHistorySource {
    fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        check_range(start, end)?;
        let path = self.path_for(symbol)?;
        if !path.is_file() {
            return Err(ForecastError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        info!("loading {} history from {}", symbol, path.display());
        let points = std::fs::File::open(&path)
            .map_err(ForecastError::from)
            .and_then(read_price_csv)
            .map_err(|e| match e {
                ForecastError::IoError(_) | ForecastError::CsvError(_) => {
                    ForecastError::DataSourceUnavailable {
                        reason: format!("{}: {}", path.display(), e),
                    }
                }
                other => other,
            })?;

        within(&symbol.to_uppercase(), &points, start, end)
    }
}

/// Price histories held in memory, keyed by upper-cased symbol
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistorySource {
    series: HashMap<String, PriceSeries>,
}

impl InMemoryHistorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, series: PriceSeries) -> Self {
        self.insert(symbol, series);
        self
    }

    pub fn insert(&mut self, symbol: &str, series: PriceSeries) {
        self.series.insert(symbol.to_uppercase(), series);
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.series.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl HistorySource for InMemoryHistorySource {
    fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        check_range(start, end)?;
        let key = symbol.to_uppercase();
        let series = self
            .series
            .get(&key)
            .ok_or_else(|| ForecastError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        within(&key, series.points(), start, end)
    }
}
