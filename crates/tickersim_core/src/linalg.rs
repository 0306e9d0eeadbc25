//! Small dense linear algebra for correlation matrices
//!
//! Matrices are square `Vec<Vec<f64>>` in row order. Sizes are the number of
//! assets in a portfolio, so the routines favour clarity over blocking.

/// Lower Cholesky factor of a symmetric positive semi-definite matrix.
///
/// Pivots below `tol` are floored to `sqrt(tol)` so rank-deficient
/// (perfectly correlated) matrices still factorize. Returns `None` if a pivot
/// is meaningfully negative, i.e. the matrix is not PSD.
#[must_use]
pub fn cholesky_lower(matrix: &[Vec<f64>], tol: f64) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    if n == 0 || matrix.iter().any(|row| row.len() != n) {
        return None;
    }

    let mut l = vec![vec![0.0_f64; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = matrix[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum < -tol.sqrt() {
                    return None;
                }
                l[i][j] = sum.max(tol).sqrt();
            } else if l[j][j] > tol {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// `out = L * z` for a lower-triangular `L`
pub fn lower_mul(l: &[Vec<f64>], z: &[f64], out: &mut [f64]) {
    for (i, row) in l.iter().enumerate() {
        out[i] = row[..=i].iter().zip(z).map(|(lij, zj)| lij * zj).sum();
    }
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns `(eigenvalues, eigenvectors)` where column `k` of the vector
/// matrix pairs with `eigenvalues[k]`.
#[must_use]
pub fn symmetric_eigen(matrix: &[Vec<f64>]) -> (Vec<f64>, Vec<Vec<f64>>) {
    const MAX_SWEEPS: usize = 100;
    const TOLERANCE: f64 = 1e-14;

    let n = matrix.len();
    let mut a = matrix.to_vec();
    let mut v = vec![vec![0.0; n]; n];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off.sqrt() < TOLERANCE {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < f64::MIN_POSITIVE {
                    continue;
                }

                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let vkp = row[p];
                    let vkq = row[q];
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let values = (0..n).map(|i| a[i][i]).collect();
    (values, v)
}

/// Project a symmetric unit-diagonal matrix onto the PSD cone.
///
/// Negative eigenvalues are clipped to `floor`, the matrix is rebuilt and
/// rescaled back to a unit diagonal. Returns the matrix and whether a repair
/// was needed.
#[must_use]
pub fn nearest_correlation(matrix: &[Vec<f64>], floor: f64) -> (Vec<Vec<f64>>, bool) {
    let n = matrix.len();
    let (values, vectors) = symmetric_eigen(matrix);
    if values.iter().all(|&ev| ev >= -floor) {
        return (matrix.to_vec(), false);
    }

    let clipped: Vec<f64> = values.iter().map(|&ev| ev.max(floor)).collect();
    let mut rebuilt = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            rebuilt[i][j] = (0..n)
                .map(|k| vectors[i][k] * clipped[k] * vectors[j][k])
                .sum();
        }
    }

    let scale: Vec<f64> = (0..n).map(|i| rebuilt[i][i].sqrt()).collect();
    for i in 0..n {
        for j in 0..n {
            rebuilt[i][j] /= scale[i] * scale[j];
        }
        rebuilt[i][i] = 1.0;
    }
    // Symmetrize away rounding noise
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (rebuilt[i][j] + rebuilt[j][i]);
            rebuilt[i][j] = avg;
            rebuilt[j][i] = avg;
        }
    }

    (rebuilt, true)
}

/// `wᵀ M w`
#[must_use]
pub fn quadratic_form(matrix: &[Vec<f64>], w: &[f64]) -> f64 {
    matrix
        .iter()
        .zip(w)
        .map(|(row, wi)| wi * row.iter().zip(w).map(|(m, wj)| m * wj).sum::<f64>())
        .sum()
}
