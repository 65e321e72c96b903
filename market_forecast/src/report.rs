//! Presentation-ready bundle of forecast, indicators and reality check

use crate::backtest::{BacktestHarness, BacktestResult};
use crate::config::AnalysisConfig;
use crate::data::{PriceSeries, PriceSummary};
use crate::error::{ForecastError, Result};
use crate::indicators::IndicatorSet;
use crate::models::{AdditiveModel, ForecastModel, ForecastResult, TrendDirection};
use crate::source::HistorySource;
use crate::utils::percent_change;
use chrono::{Months, NaiveDate};
use log::{info, warn};
use serde::Serialize;
use trade_math::IndicatorKind;

/// Where the forecast ends relative to the latest price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Outlook {
    pub direction: TrendDirection,
    pub target_date: NaiveDate,
    pub target_price: f64,
    /// Percent move from the latest price to the target
    pub expected_change_pct: Option<f64>,
}

/// Everything a presentation layer shows for one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    symbol: Option<String>,
    summary: PriceSummary,
    outlook: Outlook,
    forecast: ForecastResult,
    indicators: IndicatorSet,
    backtest: Option<BacktestResult>,
}

impl ForecastReport {
    /// Bundle components computed from `series`, checking that they all
    /// describe it
    pub fn assemble(
        series: &PriceSeries,
        forecast: ForecastResult,
        indicators: IndicatorSet,
        backtest: Option<BacktestResult>,
    ) -> Result<Self> {
        let summary = series.summary()?;

        if indicators.dates() != series.dates().as_slice() {
            return Err(ForecastError::inconsistent(
                "indicators",
                format!(
                    "indicator dates ({} entries) do not match the series dates ({} entries)",
                    indicators.dates().len(),
                    series.len()
                ),
            ));
        }

        if forecast.history_end() != summary.latest_date {
            return Err(ForecastError::inconsistent(
                "forecast",
                format!(
                    "forecast starts after {} but the series ends on {}",
                    forecast.history_end(),
                    summary.latest_date
                ),
            ));
        }
        let last = forecast
            .last()
            .copied()
            .ok_or_else(|| ForecastError::inconsistent("forecast", "forecast has no points"))?;

        if let Some(result) = &backtest {
            let window = result.held_out();
            let is_tail = window.len() <= series.len()
                && series.points()[series.len() - window.len()..] == *window.points();
            if !is_tail {
                return Err(ForecastError::inconsistent(
                    "backtest",
                    "held-out window is not the tail of the series",
                ));
            }
            if result.predicted().len() != window.len() {
                return Err(ForecastError::inconsistent(
                    "backtest",
                    format!(
                        "{} predictions for {} held-out points",
                        result.predicted().len(),
                        window.len()
                    ),
                ));
            }
        }

        let direction = if last.point_estimate > summary.latest_price {
            TrendDirection::Bullish
        } else {
            TrendDirection::Bearish
        };
        let outlook = Outlook {
            direction,
            target_date: last.date,
            target_price: last.point_estimate,
            expected_change_pct: percent_change(summary.latest_price, last.point_estimate),
        };

        Ok(Self {
            symbol: series.symbol().map(str::to_string),
            summary,
            outlook,
            forecast,
            indicators,
            backtest,
        })
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn summary(&self) -> &PriceSummary {
        &self.summary
    }

    pub fn outlook(&self) -> &Outlook {
        &self.outlook
    }

    pub fn forecast(&self) -> &ForecastResult {
        &self.forecast
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn backtest(&self) -> Option<&BacktestResult> {
        self.backtest.as_ref()
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Forecast, indicators and (optionally) a reality check for one series
///
/// Indicators whose window is longer than the series are left out, as is the
/// reality check when the series is too short to hold out the configured
/// window.
pub fn analyze(series: &PriceSeries, config: &AnalysisConfig) -> Result<ForecastReport> {
    config.validate()?;
    series.validate()?;

    let label = series.symbol().unwrap_or("series").to_string();
    info!(
        "analyzing {}: {} observations, horizon {} days",
        label,
        series.len(),
        config.horizon_days
    );

    let model = AdditiveModel::new(config.forecast.clone())?;
    let params = model.fit(series)?;
    let forecast = model.predict(&params, config.horizon_days)?;
    info!(
        "{}: fitted {} with {} changepoints",
        label,
        model.name(),
        params.trend().changepoints().len()
    );

    let kinds: Vec<IndicatorKind> = config
        .indicators
        .indicators
        .iter()
        .copied()
        .filter(|kind| {
            let fits = kind.window() <= series.len();
            if !fits {
                warn!("{}: skipping {}, only {} observations", label, kind, series.len());
            }
            fits
        })
        .collect();
    let indicators = IndicatorSet::compute(series, &kinds)?;

    let backtest = if config.run_backtest {
        let harness = BacktestHarness::new(model, config.backtest.clone())?;
        match harness.run(series, config.effective_holdout()) {
            Ok(result) => Some(result),
            Err(err @ ForecastError::InsufficientData { .. })
            | Err(err @ ForecastError::InvalidParameter { parameter: "holdout", .. }) => {
                warn!("{}: skipping reality check: {}", label, err);
                None
            }
            Err(err) => return Err(err),
        }
    } else {
        None
    };

    ForecastReport::assemble(series, forecast, indicators, backtest)
}

/// Fetch `lookback_years` of history ending at `end` and analyze it
pub fn analyze_symbol<S: HistorySource + ?Sized>(
    source: &S,
    symbol: &str,
    end: NaiveDate,
    config: &AnalysisConfig,
) -> Result<ForecastReport> {
    config.validate()?;
    let start = end
        .checked_sub_months(Months::new(12 * config.lookback_years))
        .ok_or_else(|| {
            ForecastError::invalid("end", format!("{} is too early for the lookback", end))
        })?;

    info!("fetching {} history from {} to {}", symbol, start, end);
    let series = source.fetch_history(symbol, start, end)?;
    analyze(&series, config)
}
