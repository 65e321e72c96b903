//! Penalized least squares by cyclic coordinate descent

use crate::error::{ForecastError, Result};
use log::{debug, warn};
use std::time::{Duration, Instant};

/// Penalty applied to one coefficient
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Penalty {
    /// `0.5 * lambda * beta^2`
    Ridge(f64),
    /// `lambda * |beta|`
    Lasso(f64),
}

/// Column-major design matrix with one penalty per column
#[derive(Debug, Clone, Default)]
pub(crate) struct Design {
    columns: Vec<Vec<f64>>,
    penalties: Vec<Penalty>,
}

impl Design {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: Vec<f64>, penalty: Penalty) {
        self.columns.push(column);
        self.penalties.push(penalty);
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// `X * beta`
    pub fn apply(&self, coefficients: &[f64], rows: usize) -> Vec<f64> {
        let mut out = vec![0.0; rows];
        for (column, &beta) in self.columns.iter().zip(coefficients) {
            if beta == 0.0 {
                continue;
            }
            for (o, x) in out.iter_mut().zip(column) {
                *o += x * beta;
            }
        }
        out
    }
}

/// Iteration limits and the optional wall-clock deadline
#[derive(Debug, Clone, Copy)]
pub(crate) struct SolverLimits {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub deadline: Option<(Instant, u64)>,
}

impl SolverLimits {
    pub fn new(max_iterations: usize, tolerance: f64, budget_ms: Option<u64>) -> Self {
        Self {
            max_iterations,
            tolerance,
            deadline: budget_ms.map(|ms| (Instant::now() + Duration::from_millis(ms), ms)),
        }
    }

    pub fn check_deadline(&self) -> Result<()> {
        match self.deadline {
            Some((deadline, budget_ms)) if Instant::now() > deadline => {
                Err(ForecastError::FitTimeout { budget_ms })
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Solution {
    pub coefficients: Vec<f64>,
    pub residuals: Vec<f64>,
}

fn soft_threshold(x: f64, lambda: f64) -> f64 {
    if x > lambda {
        x - lambda
    } else if x < -lambda {
        x + lambda
    } else {
        0.0
    }
}

/// Minimize `0.5 * ||y - X beta||^2 + penalties(beta)` starting from `initial`
pub(crate) fn coordinate_descent(
    design: &Design,
    y: &[f64],
    initial: &[f64],
    limits: &SolverLimits,
) -> Result<Solution> {
    let mut beta = initial.to_vec();
    beta.resize(design.width(), 0.0);

    let fitted = design.apply(&beta, y.len());
    let mut residuals: Vec<f64> = y.iter().zip(&fitted).map(|(y, f)| y - f).collect();

    let norms: Vec<f64> = design
        .columns
        .iter()
        .map(|c| c.iter().map(|x| x * x).sum())
        .collect();

    for sweep in 0..limits.max_iterations {
        limits.check_deadline()?;

        let mut max_change: f64 = 0.0;
        for (j, column) in design.columns.iter().enumerate() {
            let norm = norms[j];
            if norm == 0.0 {
                continue;
            }

            let rho = column
                .iter()
                .zip(&residuals)
                .map(|(x, r)| x * r)
                .sum::<f64>()
                + norm * beta[j];

            let updated = match design.penalties[j] {
                Penalty::Ridge(lambda) => rho / (norm + lambda),
                Penalty::Lasso(lambda) => soft_threshold(rho, lambda) / norm,
            };

            let change = updated - beta[j];
            if change != 0.0 {
                for (r, x) in residuals.iter_mut().zip(column) {
                    *r -= x * change;
                }
                beta[j] = updated;
                max_change = max_change.max(change.abs());
            }
        }

        if max_change < limits.tolerance {
            debug!("coordinate descent converged after {} sweeps", sweep + 1);
            return Ok(Solution {
                coefficients: beta,
                residuals,
            });
        }
    }

    warn!(
        "coordinate descent stopped after {} sweeps without converging",
        limits.max_iterations
    );
    Ok(Solution {
        coefficients: beta,
        residuals,
    })
}

/// Ordinary least-squares line `y = slope * x + intercept`
///
/// Falls back to a flat line through the mean when `x` has no spread.
pub(crate) fn least_squares_line(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len() as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }

    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        numerator += (xi - x_mean) * (yi - y_mean);
        denominator += (xi - x_mean) * (xi - x_mean);
    }

    if denominator.abs() < 1e-12 {
        return (0.0, y_mean);
    }

    let slope = numerator / denominator;
    (slope, y_mean - slope * x_mean)
}

/// Mean of squared residuals
pub(crate) fn mean_square(residuals: &[f64]) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64
}
