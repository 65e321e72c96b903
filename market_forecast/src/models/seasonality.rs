//! Fourier seasonal components

use crate::config::SeasonalitySetting;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const WEEKLY_PERIOD_DAYS: f64 = 7.0;
pub const YEARLY_PERIOD_DAYS: f64 = 365.25;
pub const DEFAULT_WEEKLY_ORDER: usize = 3;
pub const DEFAULT_YEARLY_ORDER: usize = 10;

/// Fitted seasonal term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeasonalComponent {
    None,
    /// `sum(a_n * sin(2 pi n d / P) + b_n * cos(2 pi n d / P))`
    Fourier {
        name: String,
        period: f64,
        order: usize,
        /// Interleaved `[a_1, b_1, a_2, b_2, ...]`
        coefficients: Vec<f64>,
    },
}

/// Absolute day number used as the seasonal phase
pub(crate) fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Fourier basis for one day: `[sin(1x), cos(1x), sin(2x), cos(2x), ...]`
pub fn fourier_features(day: f64, period: f64, order: usize) -> Vec<f64> {
    (1..=order)
        .flat_map(|n| {
            let x = 2.0 * PI * n as f64 * day / period;
            [x.sin(), x.cos()]
        })
        .collect()
}

impl SeasonalComponent {
    /// Seasonal effect on the given day
    pub fn value_at(&self, day: f64) -> f64 {
        match self {
            SeasonalComponent::None => 0.0,
            SeasonalComponent::Fourier {
                period,
                order,
                coefficients,
                ..
            } => fourier_features(day, *period, *order)
                .iter()
                .zip(coefficients)
                .map(|(x, beta)| x * beta)
                .sum(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SeasonalComponent::None => None,
            SeasonalComponent::Fourier { name, .. } => Some(name),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SeasonalComponent::None)
    }
}

/// A seasonality the fit will estimate coefficients for
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeasonalTerm {
    pub name: &'static str,
    pub period: f64,
    pub order: usize,
}

impl SeasonalTerm {
    pub fn width(&self) -> usize {
        2 * self.order
    }

    pub fn component(&self, coefficients: Vec<f64>) -> SeasonalComponent {
        SeasonalComponent::Fourier {
            name: self.name.to_string(),
            period: self.period,
            order: self.order,
            coefficients,
        }
    }
}

fn resolve(setting: SeasonalitySetting, auto_enabled: bool, default_order: usize) -> Option<usize> {
    match setting {
        SeasonalitySetting::Auto if auto_enabled => Some(default_order),
        SeasonalitySetting::Auto | SeasonalitySetting::Disabled => None,
        SeasonalitySetting::Fourier(order) => Some(order),
    }
}

/// Decide which seasonalities to fit for the given history
///
/// Yearly is automatic with at least two years of history. Weekly is automatic
/// with at least two weeks of history sampled more often than weekly.
pub(crate) fn plan_terms(
    dates: &[NaiveDate],
    weekly: SeasonalitySetting,
    yearly: SeasonalitySetting,
) -> Vec<SeasonalTerm> {
    let span_days = match (dates.first(), dates.last()) {
        (Some(&first), Some(&last)) => (last - first).num_days(),
        _ => 0,
    };
    let min_spacing = dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .min()
        .unwrap_or(i64::MAX);

    let mut terms = Vec::new();
    if let Some(order) = resolve(weekly, span_days >= 14 && min_spacing < 7, DEFAULT_WEEKLY_ORDER) {
        terms.push(SeasonalTerm {
            name: "weekly",
            period: WEEKLY_PERIOD_DAYS,
            order,
        });
    }
    if let Some(order) = resolve(yearly, span_days >= 730, DEFAULT_YEARLY_ORDER) {
        terms.push(SeasonalTerm {
            name: "yearly",
            period: YEARLY_PERIOD_DAYS,
            order,
        });
    }
    terms
}
