//! Parametric return distributions
//!
//! A [`FittedDistribution`] is a closed set of families, each exposing the
//! same capabilities: density, CDF, quantile function and sampling (directly
//! or from pre-drawn uniforms). Densities and quantiles come from `statrs`,
//! random variates from `rand_distr`.

mod fitting;

pub use fitting::{fit_normal, fit_student_t};

use rand::Rng;
use rand::distr::Distribution;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Normal, StudentsT};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionFamily {
    StudentT,
    Normal,
}

/// Fitted marginal distribution of daily log returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family")]
pub enum FittedDistribution {
    /// Location-scale Student's t. Lower `df` means fatter tails.
    StudentT { df: f64, loc: f64, scale: f64 },
    Normal { loc: f64, scale: f64 },
}

/// Continuous distribution object for evaluating densities and quantiles
enum Evaluator {
    StudentT(StudentsT),
    Normal(Normal),
}

impl Evaluator {
    fn pdf(&self, x: f64) -> f64 {
        match self {
            Evaluator::StudentT(d) => d.pdf(x),
            Evaluator::Normal(d) => d.pdf(x),
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        match self {
            Evaluator::StudentT(d) => d.cdf(x),
            Evaluator::Normal(d) => d.cdf(x),
        }
    }

    fn inverse_cdf(&self, p: f64) -> f64 {
        if !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        match self {
            Evaluator::StudentT(d) => d.inverse_cdf(p),
            Evaluator::Normal(d) => d.inverse_cdf(p),
        }
    }
}

/// Random variate generator for a [`FittedDistribution`]
#[derive(Debug, Clone)]
pub enum ReturnSampler {
    StudentT {
        standard: rand_distr::StudentT<f64>,
        loc: f64,
        scale: f64,
    },
    Normal(rand_distr::Normal<f64>),
}

impl Distribution<f64> for ReturnSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            ReturnSampler::StudentT {
                standard,
                loc,
                scale,
            } => loc + scale * standard.sample(rng),
            ReturnSampler::Normal(d) => d.sample(rng),
        }
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_parameter(
            name,
            format!("must be positive and finite, got {value}"),
        ))
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid_parameter(name, format!("must be finite, got {value}")))
    }
}

impl FittedDistribution {
    pub fn student_t(df: f64, loc: f64, scale: f64) -> Result<Self> {
        check_positive("df", df)?;
        check_finite("loc", loc)?;
        check_positive("scale", scale)?;
        Ok(FittedDistribution::StudentT { df, loc, scale })
    }

    pub fn normal(loc: f64, scale: f64) -> Result<Self> {
        check_finite("loc", loc)?;
        check_positive("scale", scale)?;
        Ok(FittedDistribution::Normal { loc, scale })
    }

    #[must_use]
    pub fn family(&self) -> DistributionFamily {
        match self {
            FittedDistribution::StudentT { .. } => DistributionFamily::StudentT,
            FittedDistribution::Normal { .. } => DistributionFamily::Normal,
        }
    }

    #[must_use]
    pub fn loc(&self) -> f64 {
        match *self {
            FittedDistribution::StudentT { loc, .. } | FittedDistribution::Normal { loc, .. } => {
                loc
            }
        }
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        match *self {
            FittedDistribution::StudentT { scale, .. }
            | FittedDistribution::Normal { scale, .. } => scale,
        }
    }

    /// Degrees of freedom, `None` for the normal family
    #[must_use]
    pub fn df(&self) -> Option<f64> {
        match *self {
            FittedDistribution::StudentT { df, .. } => Some(df),
            FittedDistribution::Normal { .. } => None,
        }
    }

    fn evaluator(&self) -> Result<Evaluator> {
        match *self {
            FittedDistribution::StudentT { df, loc, scale } => StudentsT::new(loc, scale, df)
                .map(Evaluator::StudentT)
                .map_err(|e| Error::invalid_parameter("student_t", e.to_string())),
            FittedDistribution::Normal { loc, scale } => Normal::new(loc, scale)
                .map(Evaluator::Normal)
                .map_err(|e| Error::invalid_parameter("normal", e.to_string())),
        }
    }

    /// Random variate generator. Fails only for parameters that bypassed
    /// the validating constructors (e.g. hand-edited serialized values).
    pub fn sampler(&self) -> Result<ReturnSampler> {
        match *self {
            FittedDistribution::StudentT { df, loc, scale } => rand_distr::StudentT::new(df)
                .map(|standard| ReturnSampler::StudentT {
                    standard,
                    loc,
                    scale,
                })
                .map_err(|e| Error::invalid_parameter("df", e.to_string())),
            FittedDistribution::Normal { loc, scale } => rand_distr::Normal::new(loc, scale)
                .map(ReturnSampler::Normal)
                .map_err(|e| Error::invalid_parameter("scale", e.to_string())),
        }
    }

    /// Probability density at `x`
    #[must_use]
    pub fn pdf(&self, x: f64) -> f64 {
        self.evaluator().map_or(f64::NAN, |d| d.pdf(x))
    }

    /// Cumulative probability at `x`
    #[must_use]
    pub fn cdf(&self, x: f64) -> f64 {
        self.evaluator().map_or(f64::NAN, |d| d.cdf(x))
    }

    /// Quantile function. NaN outside `[0, 1]`, infinite at the endpoints.
    #[must_use]
    pub fn ppf(&self, p: f64) -> f64 {
        self.evaluator().map_or(f64::NAN, |d| d.inverse_cdf(p))
    }

    /// Quantiles of many probabilities, building the distribution once
    pub fn ppf_many(&self, probabilities: &[f64]) -> Result<Vec<f64>> {
        let evaluator = self.evaluator()?;
        Ok(probabilities.iter().map(|&p| evaluator.inverse_cdf(p)).collect())
    }

    /// Quantiles written into `out`, which must match `probabilities` in length
    pub(crate) fn ppf_into(&self, probabilities: &[f64], out: &mut [f64]) -> Result<()> {
        let evaluator = self.evaluator()?;
        for (o, &p) in out.iter_mut().zip(probabilities) {
            *o = evaluator.inverse_cdf(p);
        }
        Ok(())
    }

    /// `count` independent draws
    pub fn sample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<f64>> {
        let sampler = self.sampler()?;
        Ok((0..count).map(|_| sampler.sample(rng)).collect())
    }

    /// Draws obtained by inverse transform of the given uniforms
    pub fn sample_from_uniforms(&self, uniforms: &[f64]) -> Result<Vec<f64>> {
        if let Some(bad) = uniforms.iter().find(|u| !(**u > 0.0 && **u < 1.0)) {
            return Err(Error::invalid_parameter(
                "uniforms",
                format!("values must lie strictly inside (0, 1), got {bad}"),
            ));
        }
        self.ppf_many(uniforms)
    }

    /// Distribution mean. NaN for a Student-t with `df <= 1`.
    #[must_use]
    pub fn mean(&self) -> f64 {
        match *self {
            FittedDistribution::StudentT { df, loc, .. } => {
                if df > 1.0 {
                    loc
                } else {
                    f64::NAN
                }
            }
            FittedDistribution::Normal { loc, .. } => loc,
        }
    }

    /// Standard deviation. Infinite for a Student-t with `1 < df <= 2`,
    /// NaN for `df <= 1`.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        match *self {
            FittedDistribution::StudentT { df, scale, .. } => {
                if df > 2.0 {
                    scale * (df / (df - 2.0)).sqrt()
                } else if df > 1.0 {
                    f64::INFINITY
                } else {
                    f64::NAN
                }
            }
            FittedDistribution::Normal { scale, .. } => scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_constructors_validate() {
        assert!(FittedDistribution::student_t(4.0, 0.0, 0.01).is_ok());
        assert!(FittedDistribution::student_t(0.0, 0.0, 0.01).is_err());
        assert!(FittedDistribution::student_t(4.0, 0.0, 0.0).is_err());
        assert!(FittedDistribution::student_t(4.0, f64::NAN, 0.01).is_err());
        assert!(FittedDistribution::normal(0.0, -1.0).is_err());
    }

    #[test]
    fn test_ppf_inverts_cdf() {
        let dists = [
            FittedDistribution::student_t(3.5, 0.001, 0.02).unwrap(),
            FittedDistribution::normal(-0.002, 0.015).unwrap(),
        ];
        for dist in dists {
            for p in [0.01, 0.25, 0.5, 0.9, 0.999] {
                let x = dist.ppf(p);
                assert!((dist.cdf(x) - p).abs() < 1e-6, "{dist:?} p={p}");
            }
            assert!((dist.ppf(0.5) - dist.loc()).abs() < 1e-8);
            assert!(dist.ppf(1.5).is_nan());
        }
    }

    #[test]
    fn test_student_t_has_heavier_tails() {
        let t = FittedDistribution::student_t(3.0, 0.0, 1.0).unwrap();
        let n = FittedDistribution::normal(0.0, 1.0).unwrap();
        assert!(t.cdf(-4.0) > n.cdf(-4.0));
        assert!(t.pdf(0.0) < n.pdf(0.0));
        assert!((n.pdf(0.0) - 1.0 / (2.0 * std::f64::consts::PI).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_moments() {
        let t = FittedDistribution::student_t(4.0, 0.01, 0.2).unwrap();
        assert!((t.std_dev() - 0.2 * 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(t.mean(), 0.01);
        assert!(FittedDistribution::student_t(1.5, 0.0, 1.0).unwrap().std_dev().is_infinite());
        assert!(FittedDistribution::student_t(0.8, 0.0, 1.0).unwrap().mean().is_nan());
    }

    #[test]
    fn test_sampling_matches_moments() {
        let dist = FittedDistribution::student_t(6.0, 0.0005, 0.01).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let draws = dist.sample(50_000, &mut rng).unwrap();

        let m = crate::stats::mean(&draws);
        let s = crate::stats::std_dev(&draws);
        assert!((m - 0.0005).abs() < 3e-4);
        assert!((s / dist.std_dev() - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_sample_from_uniforms() {
        let dist = FittedDistribution::normal(0.0, 1.0).unwrap();
        let draws = dist.sample_from_uniforms(&[0.5, 0.975]).unwrap();
        assert!(draws[0].abs() < 1e-12);
        assert!((draws[1] - 1.959_963_985).abs() < 1e-6);
        assert!(dist.sample_from_uniforms(&[0.0]).is_err());
    }

    #[test]
    fn test_serde_tagged() {
        let dist = FittedDistribution::student_t(5.0, 0.0, 0.01).unwrap();
        let json = serde_json::to_string(&dist).unwrap();
        assert!(json.contains("\"family\":\"StudentT\""));
        let back: FittedDistribution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dist);
    }
}
