//! Gaussian copula sampling
//!
//! Correlated standard normals are drawn through the Cholesky factor of the
//! correlation matrix and pushed through the standard normal CDF. Each asset
//! then maps its column of uniforms through its own quantile function, so
//! heavy-tailed marginals keep their tails while moving jointly.

use rand::Rng;
use rand_distr::StandardNormal;
use statrs::function::erf::erfc;
use tracing::warn;

use crate::error::{Error, Result};
use crate::linalg;
use crate::model::{CorrelatedUniforms, CorrelationMatrix, Grid};

/// Uniforms are kept this far from 0 and 1 so quantiles stay finite
const UNIFORM_EPS: f64 = 1e-15;

/// Eigenvalue floor used when projecting onto the PSD cone
const EIGEN_FLOOR: f64 = 1e-10;

const CHOLESKY_TOL: f64 = 1e-12;

/// Standard normal CDF
#[inline]
fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

/// Nearest positive semi-definite correlation matrix.
///
/// Returns the input unchanged (and `false`) when it is already PSD.
pub fn nearest_correlation(matrix: &CorrelationMatrix) -> Result<(CorrelationMatrix, bool)> {
    let (rows, repaired) = linalg::nearest_correlation(matrix.rows(), EIGEN_FLOOR);
    if !repaired {
        return Ok((matrix.clone(), false));
    }
    Ok((CorrelationMatrix::from_rows(matrix.labels().to_vec(), rows)?, true))
}

/// Factorized correlation structure ready for repeated sampling
#[derive(Debug, Clone)]
pub struct CopulaSampler {
    correlation: CorrelationMatrix,
    cholesky: Vec<Vec<f64>>,
    repaired: bool,
}

impl CopulaSampler {
    /// Repair (if needed) and factorize a correlation matrix
    pub fn new(matrix: &CorrelationMatrix) -> Result<Self> {
        if matrix.size() == 0 {
            return Err(Error::InvalidCorrelationMatrix("matrix is empty".into()));
        }

        let (correlation, repaired) = nearest_correlation(matrix)?;
        if repaired {
            warn!(
                assets = matrix.size(),
                "correlation matrix not positive semi-definite, projected to nearest valid"
            );
        }

        let cholesky = linalg::cholesky_lower(correlation.rows(), CHOLESKY_TOL).ok_or_else(|| {
            Error::InvalidCorrelationMatrix(
                "matrix could not be factorized after stabilization".into(),
            )
        })?;

        Ok(Self {
            correlation,
            cholesky,
            repaired,
        })
    }

    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.cholesky.len()
    }

    /// Whether the input needed a PSD repair
    #[must_use]
    pub fn was_repaired(&self) -> bool {
        self.repaired
    }

    /// The matrix actually sampled from (post-repair)
    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    /// One joint draw written into `out` (length `n_assets`).
    /// `scratch` holds the independent normals.
    pub(crate) fn fill_uniforms<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        scratch: &mut [f64],
        out: &mut [f64],
    ) {
        for z in scratch.iter_mut() {
            *z = rng.sample(StandardNormal);
        }
        linalg::lower_mul(&self.cholesky, scratch, out);
        for u in out.iter_mut() {
            *u = normal_cdf(*u).clamp(UNIFORM_EPS, 1.0 - UNIFORM_EPS);
        }
    }

    /// `sims` joint draws, shape `(sims, n_assets)`
    pub fn sample_correlated_uniforms<R: Rng + ?Sized>(
        &self,
        sims: usize,
        rng: &mut R,
    ) -> CorrelatedUniforms {
        let n = self.n_assets();
        let mut grid = Grid::new(vec![sims, n], 0.0);
        let mut scratch = vec![0.0; n];
        for sim in 0..sims {
            if let Some(row) = grid.lane_mut(&[sim]) {
                self.fill_uniforms(rng, &mut scratch, row);
            }
        }
        CorrelatedUniforms::from_grid(grid)
    }
}

/// One-shot Gaussian copula draw for `n_assets` assets.
///
/// `n_assets` must equal the dimension of `matrix`.
pub fn sample_correlated_uniforms<R: Rng + ?Sized>(
    n_assets: usize,
    matrix: &CorrelationMatrix,
    sims: usize,
    rng: &mut R,
) -> Result<CorrelatedUniforms> {
    if n_assets != matrix.size() {
        return Err(Error::invalid_parameter(
            "n_assets",
            format!("{n_assets} assets for a {0}x{0} matrix", matrix.size()),
        ));
    }
    Ok(CopulaSampler::new(matrix)?.sample_correlated_uniforms(sims, rng))
}
