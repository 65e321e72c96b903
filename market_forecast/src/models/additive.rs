//! Additive trend + seasonality regression
//!
//! The model is `y(t) = trend(t) + seasonal(t) + noise` (or
//! `trend(t) * (1 + seasonal(t)) + noise` in multiplicative mode). Fitting is
//! a MAP estimate under a Laplace prior on trend changes and Gaussian priors
//! on everything else, which reduces to penalized least squares:
//!
//! ```text
//! 0.5 |y - X b|^2 + (s^2 / tau) sum|delta|
//!     + 0.5 (s^2 / sp^2) sum beta^2 + 0.5 (s^2 / 25) (k^2 + m^2)
//! ```
//!
//! where `s` is the noise scale, re-estimated between passes.

use crate::config::{ForecastConfig, Growth, SeasonalityMode};
use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::models::seasonality::{
    day_number, fourier_features, plan_terms, SeasonalComponent, SeasonalTerm,
};
use crate::models::solver::{
    coordinate_descent, least_squares_line, mean_square, Design, Penalty, SolverLimits,
};
use crate::models::trend::{logit, manual_changepoints, place_changepoints, ramp, TrendComponent};
use crate::models::uncertainty::{combine, Simulation};
use crate::models::{ForecastModel, ForecastPoint, ForecastResult};
use crate::utils::future_dates;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Prior variance of the base growth rate and offset
const TREND_PRIOR_VARIANCE: f64 = 25.0;

/// Noise re-estimation passes for the joint fit
const OUTER_PASSES: usize = 3;

/// Trend/seasonal alternations for logistic or multiplicative fits
const BACKFIT_PASSES: usize = 10;

/// Keeps `price / cap` away from 0 and 1 before taking the logit
const LOGIT_EPS: f64 = 1e-6;

/// Fitted state of an [`AdditiveModel`]
///
/// Coefficients are stored on the scaled axes used during fitting (time in
/// `[0, 1]` over the history, prices divided by `y_scale`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    start: NaiveDate,
    history_end: NaiveDate,
    span_days: f64,
    y_scale: f64,
    trend: TrendComponent,
    weekly: SeasonalComponent,
    yearly: SeasonalComponent,
    mode: SeasonalityMode,
    sigma: f64,
    interval_width: f64,
    uncertainty_samples: usize,
    seed: u64,
    observations: usize,
}

impl ModelParameters {
    pub fn trend(&self) -> &TrendComponent {
        &self.trend
    }

    pub fn weekly(&self) -> &SeasonalComponent {
        &self.weekly
    }

    pub fn yearly(&self) -> &SeasonalComponent {
        &self.yearly
    }

    pub fn seasonality_mode(&self) -> SeasonalityMode {
        self.mode
    }

    /// Residual noise scale in price units
    pub fn noise_scale(&self) -> f64 {
        self.sigma * self.y_scale
    }

    /// Divisor applied to prices before fitting
    pub fn y_scale(&self) -> f64 {
        self.y_scale
    }

    pub fn history_start(&self) -> NaiveDate {
        self.start
    }

    pub fn history_end(&self) -> NaiveDate {
        self.history_end
    }

    /// Number of observations the model was fitted on
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Changepoint locations as calendar dates
    pub fn changepoint_dates(&self) -> Vec<NaiveDate> {
        self.trend
            .changepoints()
            .iter()
            .map(|&s| self.start + chrono::Duration::days((s * self.span_days).round() as i64))
            .collect()
    }

    fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    /// Evaluate the model on arbitrary ascending dates
    pub fn predict_at(&self, dates: &[NaiveDate]) -> Result<ForecastResult> {
        if dates.is_empty() {
            return Err(ForecastError::invalid("dates", "at least one date is required"));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::invalid("dates", "dates must be strictly increasing"));
        }

        let t: Vec<f64> = dates.iter().map(|&d| self.scaled_time(d)).collect();
        let trend: Vec<f64> = t.iter().map(|&ti| self.trend.value_at(ti)).collect();
        let seasonal: Vec<f64> = dates
            .iter()
            .map(|&d| {
                let day = day_number(d);
                self.weekly.value_at(day) + self.yearly.value_at(day)
            })
            .collect();
        let point: Vec<f64> = trend
            .iter()
            .zip(&seasonal)
            .map(|(&g, &s)| combine(self.mode, g, s))
            .collect();

        let simulation = Simulation {
            trend: &self.trend,
            mode: self.mode,
            sigma: self.sigma,
            interval_width: self.interval_width,
            samples: self.uncertainty_samples,
            seed: self.seed,
        };
        let widths = simulation.half_widths(&t, &seasonal, &point)?;

        let scale = self.y_scale;
        let points = dates
            .iter()
            .zip(point.iter().zip(&trend))
            .zip(widths)
            .map(|((&date, (&p, &g)), (lower, upper))| ForecastPoint {
                date,
                point_estimate: p * scale,
                lower_bound: (p - lower) * scale,
                upper_bound: (p + upper) * scale,
                trend: g * scale,
            })
            .collect();

        ForecastResult::new(points, self.history_end, self.interval_width)
    }
}

/// Coefficients produced by one of the fitting strategies
struct Fitted {
    trend: TrendComponent,
    betas: Vec<f64>,
    sigma: f64,
}

/// Column penalties derived from the current noise estimate
struct Priors {
    base: f64,
    delta: f64,
    beta: f64,
}

impl Priors {
    fn new(sigma2: f64, config: &ForecastConfig) -> Self {
        Self {
            base: sigma2 / TREND_PRIOR_VARIANCE,
            delta: sigma2 / config.changepoint_prior_scale,
            beta: sigma2 / config.seasonality_prior_scale.powi(2),
        }
    }
}

/// Scaled inputs shared by both fitting strategies
struct History<'a> {
    t: Vec<f64>,
    y: Vec<f64>,
    changepoints: Vec<f64>,
    seasonal_columns: Vec<Vec<f64>>,
    config: &'a ForecastConfig,
    limits: SolverLimits,
}

impl History<'_> {
    fn push_trend_columns(&self, design: &mut Design, priors: &Priors) {
        design.push(vec![1.0; self.t.len()], Penalty::Ridge(priors.base));
        design.push(self.t.clone(), Penalty::Ridge(priors.base));
        for &s in &self.changepoints {
            let column = self.t.iter().map(|&ti| ramp(ti, s)).collect();
            design.push(column, Penalty::Lasso(priors.delta));
        }
    }

    fn push_seasonal_columns(&self, design: &mut Design, priors: &Priors, weights: Option<&[f64]>) {
        for column in &self.seasonal_columns {
            let column = match weights {
                Some(w) => column.iter().zip(w).map(|(x, w)| x * w).collect(),
                None => column.clone(),
            };
            design.push(column, Penalty::Ridge(priors.beta));
        }
    }

    fn seasonal_effect(&self, betas: &[f64]) -> Vec<f64> {
        let mut effect = vec![0.0; self.y.len()];
        for (column, &beta) in self.seasonal_columns.iter().zip(betas) {
            for (e, x) in effect.iter_mut().zip(column) {
                *e += x * beta;
            }
        }
        effect
    }

    fn split_trend(&self, coefficients: &[f64], cap: Option<f64>) -> TrendComponent {
        TrendComponent::assemble(
            cap,
            coefficients[1],
            coefficients[0],
            self.changepoints.clone(),
            coefficients[2..2 + self.changepoints.len()].to_vec(),
        )
    }

    /// Single penalized regression over trend and seasonal columns
    fn fit_joint(&self) -> Result<Fitted> {
        let (slope, intercept) = least_squares_line(&self.t, &self.y);
        let mut coefficients = vec![intercept, slope];
        coefficients.resize(2 + self.changepoints.len() + self.seasonal_columns.len(), 0.0);

        let mut sigma2 = mean_square(
            &self
                .t
                .iter()
                .zip(&self.y)
                .map(|(&ti, &yi)| yi - (intercept + slope * ti))
                .collect::<Vec<_>>(),
        );

        for pass in 0..OUTER_PASSES {
            let priors = Priors::new(sigma2, self.config);
            let mut design = Design::new();
            self.push_trend_columns(&mut design, &priors);
            self.push_seasonal_columns(&mut design, &priors, None);

            let solution = coordinate_descent(&design, &self.y, &coefficients, &self.limits)?;
            coefficients = solution.coefficients;
            sigma2 = mean_square(&solution.residuals);
            debug!("joint fit pass {}: sigma {:.6}", pass + 1, sigma2.sqrt());
        }

        let n_trend = 2 + self.changepoints.len();
        Ok(Fitted {
            trend: self.split_trend(&coefficients, None),
            betas: coefficients[n_trend..].to_vec(),
            sigma: sigma2.sqrt(),
        })
    }

    /// Alternate trend and seasonal fits for logistic growth or
    /// multiplicative seasonality
    fn fit_backfitting(&self, cap: Option<f64>, mode: SeasonalityMode) -> Result<Fitted> {
        let n = self.y.len();
        let mut seasonal = vec![0.0; n];
        let mut betas = vec![0.0; self.seasonal_columns.len()];
        let mut trend_coefficients: Option<Vec<f64>> = None;
        let mut trend = TrendComponent::Linear { k: 0.0, m: 0.0 };
        let mut sigma2 = 0.0;

        for pass in 0..BACKFIT_PASSES {
            let target: Vec<f64> = self
                .y
                .iter()
                .zip(&seasonal)
                .map(|(&yi, &si)| match mode {
                    SeasonalityMode::Additive => yi - si,
                    SeasonalityMode::Multiplicative if 1.0 + si > 1e-6 => yi / (1.0 + si),
                    SeasonalityMode::Multiplicative => yi,
                })
                .collect();
            let link_target: Vec<f64> = match cap {
                Some(cap) => target
                    .iter()
                    .map(|&v| logit((v / cap).clamp(LOGIT_EPS, 1.0 - LOGIT_EPS)))
                    .collect(),
                None => target,
            };

            let initial = match trend_coefficients.take() {
                Some(c) => c,
                None => {
                    let (slope, intercept) = least_squares_line(&self.t, &link_target);
                    let mut c = vec![intercept, slope];
                    c.resize(2 + self.changepoints.len(), 0.0);
                    c
                }
            };

            let mut design = Design::new();
            self.push_trend_columns(&mut design, &Priors::new(0.0, self.config));
            let fitted_link = design.apply(&initial, n);
            let link_sigma2 = mean_square(
                &link_target
                    .iter()
                    .zip(&fitted_link)
                    .map(|(a, b)| a - b)
                    .collect::<Vec<_>>(),
            );

            let mut design = Design::new();
            self.push_trend_columns(&mut design, &Priors::new(link_sigma2, self.config));
            let solution = coordinate_descent(&design, &link_target, &initial, &self.limits)?;
            trend = self.split_trend(&solution.coefficients, cap);
            trend_coefficients = Some(solution.coefficients);

            let g: Vec<f64> = self.t.iter().map(|&ti| trend.value_at(ti)).collect();

            if !self.seasonal_columns.is_empty() {
                let remainder: Vec<f64> = self.y.iter().zip(&g).map(|(y, g)| y - g).collect();
                let current: Vec<f64> = g
                    .iter()
                    .zip(&seasonal)
                    .map(|(&gi, &si)| combine(mode, gi, si) - gi)
                    .collect();
                sigma2 = mean_square(
                    &remainder
                        .iter()
                        .zip(&current)
                        .map(|(r, c)| r - c)
                        .collect::<Vec<_>>(),
                );

                let weights = match mode {
                    SeasonalityMode::Additive => None,
                    SeasonalityMode::Multiplicative => Some(g.as_slice()),
                };
                let mut design = Design::new();
                self.push_seasonal_columns(&mut design, &Priors::new(sigma2, self.config), weights);
                let solution = coordinate_descent(&design, &remainder, &betas, &self.limits)?;
                betas = solution.coefficients;
                seasonal = self.seasonal_effect(&betas);
            }

            let residuals: Vec<f64> = self
                .y
                .iter()
                .zip(g.iter().zip(&seasonal))
                .map(|(&yi, (&gi, &si))| yi - combine(mode, gi, si))
                .collect();
            sigma2 = mean_square(&residuals);
            debug!("backfitting pass {}: sigma {:.6}", pass + 1, sigma2.sqrt());
        }

        Ok(Fitted {
            trend,
            betas,
            sigma: sigma2.sqrt(),
        })
    }
}

fn seasonal_columns(days: &[f64], terms: &[SeasonalTerm]) -> Vec<Vec<f64>> {
    let mut columns = Vec::new();
    for term in terms {
        let rows: Vec<Vec<f64>> = days
            .iter()
            .map(|&d| fourier_features(d, term.period, term.order))
            .collect();
        for feature in 0..term.width() {
            columns.push(rows.iter().map(|row| row[feature]).collect());
        }
    }
    columns
}

/// Fit the additive model to a price series
pub fn fit(series: &PriceSeries, config: &ForecastConfig) -> Result<ModelParameters> {
    config.validate()?;
    series.validate()?;
    if series.len() < 2 {
        return Err(ForecastError::InsufficientData {
            required: 2,
            actual: series.len(),
        });
    }

    let limits = SolverLimits::new(config.max_iterations, config.tolerance, config.fit_budget_ms);

    let dates = series.dates();
    let start = dates[0];
    let history_end = dates[dates.len() - 1];
    let span_days = (history_end - start).num_days() as f64;
    let t: Vec<f64> = dates
        .iter()
        .map(|&d| (d - start).num_days() as f64 / span_days)
        .collect();
    let days: Vec<f64> = dates.iter().map(|&d| day_number(d)).collect();

    let values = series.values();
    let max_abs = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let y_scale = if max_abs > 0.0 { max_abs } else { 1.0 };
    let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

    let changepoints = match &config.changepoints {
        Some(manual) => manual_changepoints(
            manual
                .iter()
                .map(|&d| (d - start).num_days() as f64 / span_days)
                .collect(),
        )?,
        None => place_changepoints(&t, config.n_changepoints, config.changepoint_range),
    };
    let cap = match config.growth {
        Growth::Linear => None,
        Growth::Logistic { cap } => Some(cap / y_scale),
    };
    let terms = plan_terms(&dates, config.weekly_seasonality, config.yearly_seasonality);

    debug!(
        "fitting {} observations over {} days: {} changepoints, seasonalities {:?}",
        y.len(),
        span_days,
        changepoints.len(),
        terms.iter().map(|term| term.name).collect::<Vec<_>>()
    );

    let history = History {
        seasonal_columns: seasonal_columns(&days, &terms),
        t,
        y,
        changepoints,
        config,
        limits,
    };

    let fitted = match (cap, config.seasonality_mode) {
        (None, SeasonalityMode::Additive) => history.fit_joint()?,
        (cap, mode) => history.fit_backfitting(cap, mode)?,
    };

    let mut weekly = SeasonalComponent::None;
    let mut yearly = SeasonalComponent::None;
    let mut offset = 0;
    for term in &terms {
        let component = term.component(fitted.betas[offset..offset + term.width()].to_vec());
        offset += term.width();
        match term.name {
            "weekly" => weekly = component,
            _ => yearly = component,
        }
    }

    Ok(ModelParameters {
        start,
        history_end,
        span_days,
        y_scale,
        trend: fitted.trend,
        weekly,
        yearly,
        mode: config.seasonality_mode,
        sigma: fitted.sigma,
        interval_width: config.interval_width,
        uncertainty_samples: config.uncertainty_samples,
        seed: config.seed,
        observations: series.len(),
    })
}

/// Forecast `horizon` calendar days past the end of the fitted history
pub fn predict(params: &ModelParameters, horizon: usize) -> Result<ForecastResult> {
    if horizon == 0 {
        return Err(ForecastError::invalid("horizon", "must be greater than zero"));
    }
    let dates = future_dates(params.history_end, horizon);
    params.predict_at(&dates)
}

/// Additive trend + seasonality forecasting model
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    name: String,
    config: ForecastConfig,
}

impl AdditiveModel {
    /// Create a model, validating its configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let name = match config.growth {
            Growth::Linear => "Additive (piecewise-linear trend)".to_string(),
            Growth::Logistic { cap } => format!("Additive (logistic trend, cap={})", cap),
        };
        Ok(Self { name, config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Evaluate fitted parameters on the given dates
    pub fn predict_at(
        &self,
        params: &ModelParameters,
        dates: &[NaiveDate],
    ) -> Result<ForecastResult> {
        params.predict_at(dates)
    }
}

impl ForecastModel for AdditiveModel {
    type Params = ModelParameters;

    fn fit(&self, series: &PriceSeries) -> Result<ModelParameters> {
        fit(series, &self.config)
    }

    fn predict(&self, params: &ModelParameters, horizon: usize) -> Result<ForecastResult> {
        predict(params, horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
