//! Maximum-likelihood fits of daily log returns
//!
//! The Student-t fit searches `(ln ν, μ, ln σ)` with a bounded Nelder-Mead
//! simplex so `ν` and `σ` stay strictly positive. The normal fit is closed
//! form.

use statrs::function::gamma::ln_gamma;
use tracing::debug;

use super::FittedDistribution;
use crate::config::FitConfig;
use crate::error::{Error, Result};
use crate::optimization::{NelderMeadSettings, minimize};

const MIN_DF: f64 = 0.5;
const MAX_DF: f64 = 1000.0;
const START_DF: f64 = 5.0;

/// Scale search range relative to the sample standard deviation
const SCALE_FLOOR_FACTOR: f64 = 1e-3;
const SCALE_CEIL_FACTOR: f64 = 10.0;

/// Log-space distance from a bound at which an optimum counts as pinned to it
const BOUND_TOLERANCE: f64 = 1e-4;

/// Finite values of `returns`, failing if there are too few or they are
/// all identical
fn usable_sample(returns: &[f64], config: &FitConfig) -> Result<Vec<f64>> {
    let sample: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
    if sample.len() < config.min_samples {
        return Err(Error::Fitting(format!(
            "need at least {} finite returns, found {}",
            config.min_samples,
            sample.len()
        )));
    }

    let first = sample[0];
    if sample.iter().all(|&r| r == first) {
        return Err(Error::Fitting(
            "returns have zero variance, distribution is degenerate".into(),
        ));
    }
    Ok(sample)
}

fn population_moments(sample: &[f64]) -> (f64, f64) {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let variance = sample.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn median(sample: &[f64]) -> f64 {
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Negative log-likelihood of a location-scale Student-t
fn student_t_nll(sample: &[f64], df: f64, loc: f64, scale: f64) -> f64 {
    let n = sample.len() as f64;
    let norm = ln_gamma(0.5 * (df + 1.0))
        - ln_gamma(0.5 * df)
        - 0.5 * (df * std::f64::consts::PI).ln()
        - scale.ln();

    let tail: f64 = sample
        .iter()
        .map(|x| {
            let z = (x - loc) / scale;
            (z * z / df).ln_1p()
        })
        .sum();

    -(n * norm - 0.5 * (df + 1.0) * tail)
}

/// Student-t parameters `(ν, μ, σ)` by maximum likelihood.
pub fn fit_student_t(returns: &[f64], config: &FitConfig) -> Result<FittedDistribution> {
    let sample = usable_sample(returns, config)?;
    let (_, sigma0) = population_moments(&sample);

    let lo = sample.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let start = [START_DF.ln(), median(&sample), sigma0.ln()];
    let scale_floor = (sigma0 * SCALE_FLOOR_FACTOR).ln();
    let bounds = [
        (MIN_DF.ln(), MAX_DF.ln()),
        (lo, hi),
        (scale_floor, (sigma0 * SCALE_CEIL_FACTOR).ln()),
    ];

    let minimum = minimize(
        |p| student_t_nll(&sample, p[0].exp(), p[1], p[2].exp()),
        &start,
        &bounds,
        NelderMeadSettings {
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        },
    );

    if !minimum.converged {
        return Err(Error::Fitting(format!(
            "likelihood search did not converge within {} iterations",
            config.max_iterations
        )));
    }
    if !minimum.value.is_finite() {
        return Err(Error::Fitting("likelihood is not finite at the optimum".into()));
    }

    // An optimum pinned to the lower df or scale bound means the likelihood
    // is unbounded there, e.g. a point mass of unchanged closes
    if minimum.point[0] - MIN_DF.ln() < BOUND_TOLERANCE {
        return Err(Error::Fitting(format!(
            "degrees of freedom collapsed to the lower bound {MIN_DF}"
        )));
    }
    if minimum.point[2] - scale_floor < BOUND_TOLERANCE {
        return Err(Error::Fitting(format!(
            "scale collapsed to the floor {:.3e}",
            scale_floor.exp()
        )));
    }

    let df = minimum.point[0].exp();
    let loc = minimum.point[1];
    let scale = minimum.point[2].exp();
    debug!(
        samples = sample.len(),
        iterations = minimum.iterations,
        df,
        loc,
        scale,
        "fitted student-t"
    );

    FittedDistribution::student_t(df, loc, scale)
        .map_err(|e| Error::Fitting(format!("fit produced invalid parameters: {e}")))
}

/// Normal parameters: the sample mean and the maximum-likelihood
/// (population) standard deviation.
pub fn fit_normal(returns: &[f64], config: &FitConfig) -> Result<FittedDistribution> {
    let sample = usable_sample(returns, config)?;
    let (mean, sigma) = population_moments(&sample);
    debug!(samples = sample.len(), mean, sigma, "fitted normal");

    FittedDistribution::normal(mean, sigma)
        .map_err(|e| Error::Fitting(format!("fit produced invalid parameters: {e}")))
}
