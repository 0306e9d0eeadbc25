//! Labelled correlation and covariance matrices over a list of assets

use serde::{Deserialize, Serialize};

use super::ids::AssetCode;
use super::returns::AlignedReturns;
use crate::error::{Error, Result};
use crate::linalg::quadratic_form;
use crate::stats::pearson_correlation;

/// Tolerance for symmetry and unit-diagonal checks
const MATRIX_TOLERANCE: f64 = 1e-8;

/// Symmetric correlation matrix with a unit diagonal.
///
/// Rows and columns follow `labels`. Positive semi-definiteness is not
/// guaranteed here; the copula sampler repairs it before factorizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    labels: Vec<AssetCode>,
    rows: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Validate and wrap explicit matrix rows
    pub fn from_rows(labels: Vec<AssetCode>, mut rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = labels.len();
        if rows.len() != n || rows.iter().any(|row| row.len() != n) {
            return Err(Error::InvalidCorrelationMatrix(format!(
                "expected a {n}x{n} matrix"
            )));
        }

        for i in 0..n {
            if (rows[i][i] - 1.0).abs() > MATRIX_TOLERANCE {
                return Err(Error::InvalidCorrelationMatrix(format!(
                    "diagonal entry {i} is {}, expected 1",
                    rows[i][i]
                )));
            }
            rows[i][i] = 1.0;
            for j in (i + 1)..n {
                let (a, b) = (rows[i][j], rows[j][i]);
                if !a.is_finite() || !b.is_finite() {
                    return Err(Error::InvalidCorrelationMatrix(format!(
                        "entry ({i}, {j}) is not finite"
                    )));
                }
                if (a - b).abs() > MATRIX_TOLERANCE {
                    return Err(Error::InvalidCorrelationMatrix(format!(
                        "not symmetric at ({i}, {j}): {a} vs {b}"
                    )));
                }
                if a.abs() > 1.0 + MATRIX_TOLERANCE {
                    return Err(Error::InvalidCorrelationMatrix(format!(
                        "entry ({i}, {j}) = {a} is outside [-1, 1]"
                    )));
                }
                let v = a.clamp(-1.0, 1.0);
                rows[i][j] = v;
                rows[j][i] = v;
            }
        }

        Ok(Self { labels, rows })
    }

    #[must_use]
    pub fn identity(labels: Vec<AssetCode>) -> Self {
        let n = labels.len();
        let rows = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Self { labels, rows }
    }

    /// Pairwise Pearson correlation of date-aligned return columns
    pub fn from_returns(labels: Vec<AssetCode>, returns: &AlignedReturns) -> Result<Self> {
        let n = labels.len();
        if returns.columns.len() != n {
            return Err(Error::InvalidCorrelationMatrix(format!(
                "{} return columns for {n} labels",
                returns.columns.len()
            )));
        }

        let mut rows = vec![vec![0.0; n]; n];
        for i in 0..n {
            rows[i][i] = 1.0;
            for j in (i + 1)..n {
                let r = pearson_correlation(&returns.columns[i], &returns.columns[j]);
                if !r.is_finite() {
                    return Err(Error::InvalidCorrelationMatrix(format!(
                        "correlation between {} and {} is undefined",
                        labels[i], labels[j]
                    )));
                }
                rows[i][j] = r;
                rows[j][i] = r;
            }
        }

        Self::from_rows(labels, rows)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[AssetCode] {
        &self.labels
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.rows.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Upper-triangle entries as `(i, j, value)`
    pub fn off_diagonal(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.size()).flat_map(move |i| {
            ((i + 1)..self.size()).map(move |j| (i, j, self.rows[i][j]))
        })
    }
}

/// Annualized covariance matrix, `corr_ij * vol_i * vol_j`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceMatrix {
    labels: Vec<AssetCode>,
    rows: Vec<Vec<f64>>,
}

impl CovarianceMatrix {
    pub fn from_correlation(correlation: &CorrelationMatrix, volatilities: &[f64]) -> Result<Self> {
        let n = correlation.size();
        if volatilities.len() != n {
            return Err(Error::invalid_parameter(
                "volatilities",
                format!("expected {n} values, got {}", volatilities.len()),
            ));
        }
        if let Some(bad) = volatilities.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(Error::invalid_parameter(
                "volatilities",
                format!("volatility must be finite and non-negative, got {bad}"),
            ));
        }

        let rows = correlation
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, c)| c * volatilities[i] * volatilities[j])
                    .collect()
            })
            .collect();

        Ok(Self {
            labels: correlation.labels().to_vec(),
            rows,
        })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[AssetCode] {
        &self.labels
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.rows.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Portfolio variance `wᵀ Σ w` for a weight vector in label order
    #[must_use]
    pub fn portfolio_variance(&self, weights: &[f64]) -> f64 {
        quadratic_form(&self.rows, weights)
    }
}
