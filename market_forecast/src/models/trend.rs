//! Trend components and changepoint placement
//!
//! Time is measured on the model's scaled axis: 0 at the first observation,
//! 1 at the last. Trends are evaluated in a "link" space that is the price
//! axis itself for linear growth and the logit of `price / cap` for logistic
//! growth, so changepoints shift the growth rate the same way in both cases.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Fitted trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrendComponent {
    /// `k * t + m`
    Linear { k: f64, m: f64 },
    /// `k * t + m + sum(delta_j * max(t - s_j, 0))`
    PiecewiseLinear {
        k: f64,
        m: f64,
        changepoints: Vec<f64>,
        deltas: Vec<f64>,
    },
    /// `cap * sigmoid(k * t + m + sum(delta_j * max(t - s_j, 0)))`
    Logistic {
        k: f64,
        m: f64,
        cap: f64,
        changepoints: Vec<f64>,
        deltas: Vec<f64>,
    },
}

/// Hinge feature for a changepoint at `s`
pub(crate) fn ramp(t: f64, s: f64) -> f64 {
    (t - s).max(0.0)
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

pub(crate) fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

impl TrendComponent {
    /// Build the variant matching the growth shape and changepoint count
    pub(crate) fn assemble(
        logistic_cap: Option<f64>,
        k: f64,
        m: f64,
        changepoints: Vec<f64>,
        deltas: Vec<f64>,
    ) -> Self {
        match logistic_cap {
            Some(cap) => TrendComponent::Logistic {
                k,
                m,
                cap,
                changepoints,
                deltas,
            },
            None if changepoints.is_empty() => TrendComponent::Linear { k, m },
            None => TrendComponent::PiecewiseLinear {
                k,
                m,
                changepoints,
                deltas,
            },
        }
    }

    /// Changepoint locations on the scaled time axis
    pub fn changepoints(&self) -> &[f64] {
        match self {
            TrendComponent::Linear { .. } => &[],
            TrendComponent::PiecewiseLinear { changepoints, .. }
            | TrendComponent::Logistic { changepoints, .. } => changepoints,
        }
    }

    /// Rate adjustments at each changepoint
    pub fn deltas(&self) -> &[f64] {
        match self {
            TrendComponent::Linear { .. } => &[],
            TrendComponent::PiecewiseLinear { deltas, .. }
            | TrendComponent::Logistic { deltas, .. } => deltas,
        }
    }

    /// Base growth rate and offset
    pub fn rate_and_offset(&self) -> (f64, f64) {
        match self {
            TrendComponent::Linear { k, m }
            | TrendComponent::PiecewiseLinear { k, m, .. }
            | TrendComponent::Logistic { k, m, .. } => (*k, *m),
        }
    }

    /// Growth rate in effect after the final changepoint
    pub fn final_rate(&self) -> f64 {
        let (k, _) = self.rate_and_offset();
        k + self.deltas().iter().sum::<f64>()
    }

    /// Trend value in link space
    pub fn link(&self, t: f64) -> f64 {
        let (k, m) = self.rate_and_offset();
        let shifts: f64 = self
            .changepoints()
            .iter()
            .zip(self.deltas())
            .map(|(&s, &delta)| delta * ramp(t, s))
            .sum();
        k * t + m + shifts
    }

    /// Map a link-space value back to the price axis
    pub fn from_link(&self, z: f64) -> f64 {
        match self {
            TrendComponent::Logistic { cap, .. } => cap * sigmoid(z),
            _ => z,
        }
    }

    /// Trend value on the (scaled) price axis
    pub fn value_at(&self, t: f64) -> f64 {
        self.from_link(self.link(t))
    }
}

/// Spread `n_changepoints` potential changepoints evenly over the first
/// `range` fraction of the observations.
///
/// `t` is the scaled time of each observation. The first observation is never
/// a changepoint and duplicates produced by rounding on short histories are
/// dropped.
pub fn place_changepoints(t: &[f64], n_changepoints: usize, range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * range).floor() as usize;
    if hist_size < 2 {
        return Vec::new();
    }

    let n = n_changepoints.min(hist_size - 1);
    if n == 0 {
        return Vec::new();
    }

    let last_index = (hist_size - 1) as f64;
    let mut placed: Vec<f64> = (1..=n)
        .map(|i| {
            let index = (last_index * i as f64 / n as f64).round() as usize;
            t[index]
        })
        .filter(|&s| s > 0.0)
        .collect();
    placed.dedup();
    placed
}

/// Convert user supplied changepoint offsets (in scaled time) into a sorted,
/// de-duplicated list, rejecting anything outside the history.
pub fn manual_changepoints(mut offsets: Vec<f64>) -> Result<Vec<f64>> {
    if let Some(&bad) = offsets.iter().find(|&&s| !(s > 0.0 && s < 1.0)) {
        return Err(ForecastError::invalid(
            "changepoints",
            format!(
                "changepoints must fall strictly inside the history, got scaled time {}",
                bad
            ),
        ));
    }

    offsets.sort_by(f64::total_cmp);
    offsets.dedup();
    Ok(offsets)
}
