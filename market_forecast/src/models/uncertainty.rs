//! Interval estimation by simulating future trend changes and noise

use crate::config::SeasonalityMode;
use crate::error::{ForecastError, Result};
use crate::models::trend::TrendComponent;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Poisson, StandardNormal};
use statrs::distribution::{ContinuousCDF, Normal};

/// Floor on the Laplace scale of simulated trend changes
const DELTA_SCALE_FLOOR: f64 = 1e-8;

/// Settings and fitted quantities the simulation needs, all on the scaled axis
pub(crate) struct Simulation<'a> {
    pub trend: &'a TrendComponent,
    pub mode: SeasonalityMode,
    pub sigma: f64,
    pub interval_width: f64,
    pub samples: usize,
    pub seed: u64,
}

/// Combine trend and seasonal effect according to the seasonality mode
pub(crate) fn combine(mode: SeasonalityMode, trend: f64, seasonal: f64) -> f64 {
    match mode {
        SeasonalityMode::Additive => trend + seasonal,
        SeasonalityMode::Multiplicative => trend * (1.0 + seasonal),
    }
}

/// Two-sided standard normal quantile for the interval width
pub(crate) fn z_score(interval_width: f64) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::invalid("interval_width", e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + interval_width / 2.0))
}

/// Linear-interpolated quantile of an ascending slice
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

fn laplace(rng: &mut StdRng, scale: f64) -> Result<f64> {
    let magnitude: f64 = Exp::new(1.0 / scale)
        .map_err(|e| ForecastError::invalid("uncertainty", e.to_string()))?
        .sample(rng);
    Ok(if rng.gen::<bool>() { magnitude } else { -magnitude })
}

impl<'a> Simulation<'a> {
    /// Lower and upper half-widths around each point estimate
    ///
    /// `t` must be ascending. Half-widths never fall below the in-sample
    /// noise spread, and past the end of history (`t > 1`) they never shrink
    /// from one point to the next.
    pub fn half_widths(
        &self,
        t: &[f64],
        seasonal: &[f64],
        point: &[f64],
    ) -> Result<Vec<(f64, f64)>> {
        let floor = z_score(self.interval_width)? * self.sigma;

        let mut widths: Vec<(f64, f64)> = if self.samples == 0 {
            vec![(floor, floor); t.len()]
        } else {
            self.simulated_widths(t, seasonal, point)?
        };

        let mut carried = (0.0_f64, 0.0_f64);
        for (i, width) in widths.iter_mut().enumerate() {
            width.0 = width.0.max(floor);
            width.1 = width.1.max(floor);
            if t[i] > 1.0 {
                width.0 = width.0.max(carried.0);
                width.1 = width.1.max(carried.1);
                carried = *width;
            }
        }

        Ok(widths)
    }

    fn simulated_widths(
        &self,
        t: &[f64],
        seasonal: &[f64],
        point: &[f64],
    ) -> Result<Vec<(f64, f64)>> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let deltas = self.trend.deltas();
        let n_changepoints = self.trend.changepoints().len();
        let mean_abs_delta = if deltas.is_empty() {
            0.0
        } else {
            deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64
        };
        let t_max = t.iter().copied().fold(1.0_f64, f64::max);

        // Future changes are only simulated where the fit found any trend
        // movement at all, so a flat history keeps zero-width intervals.
        let change_rate = n_changepoints as f64 * (t_max - 1.0);
        let poisson = if mean_abs_delta > 0.0 && change_rate > 0.0 {
            Some(
                Poisson::new(change_rate)
                    .map_err(|e| ForecastError::invalid("uncertainty", e.to_string()))?,
            )
        } else {
            None
        };

        let mut draws = vec![Vec::with_capacity(self.samples); t.len()];
        for _ in 0..self.samples {
            let mut changes: Vec<(f64, f64)> = Vec::new();
            if let Some(poisson) = &poisson {
                let count: f64 = poisson.sample(&mut rng);
                for _ in 0..count as usize {
                    let at = rng.gen_range(1.0..t_max);
                    let delta = laplace(&mut rng, mean_abs_delta + DELTA_SCALE_FLOOR)?;
                    changes.push((at, delta));
                }
            }

            for (i, &ti) in t.iter().enumerate() {
                let extra: f64 = changes
                    .iter()
                    .map(|&(at, delta)| delta * (ti - at).max(0.0))
                    .sum();
                let trend = self.trend.from_link(self.trend.link(ti) + extra);
                let noise: f64 = rng.sample(StandardNormal);
                draws[i].push(combine(self.mode, trend, seasonal[i]) + self.sigma * noise);
            }
        }

        let lower_q = (1.0 - self.interval_width) / 2.0;
        let upper_q = (1.0 + self.interval_width) / 2.0;

        Ok(draws
            .into_iter()
            .zip(point)
            .map(|(mut samples, &estimate)| {
                samples.sort_by(f64::total_cmp);
                let lower = (estimate - quantile(&samples, lower_q)).max(0.0);
                let upper = (quantile(&samples, upper_q) - estimate).max(0.0);
                (lower, upper)
            })
            .collect())
    }
}
