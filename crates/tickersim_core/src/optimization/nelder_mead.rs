//! Nelder-Mead simplex minimization
//!
//! Derivative-free search over a box-bounded parameter space. Maintains a
//! simplex of N+1 points in N dimensions and reflects, expands, contracts or
//! shrinks it toward the minimum. Every candidate is clamped back into bounds.

/// Standard Nelder-Mead coefficients
const REFLECTION_COEF: f64 = 1.0;
const EXPANSION_COEF: f64 = 2.0;
const CONTRACTION_COEF: f64 = 0.5;
const SHRINK_COEF: f64 = 0.5;

/// Initial simplex edge as a fraction of each parameter's range
const INITIAL_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadSettings {
    pub max_iterations: usize,
    /// Converged once the spread of objective values across the simplex is
    /// below `tolerance * (1 + |best|)`, or the simplex itself is smaller
    /// than `tolerance`
    pub tolerance: f64,
}

/// Best point found by [`minimize`]
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// A point in parameter space with its evaluation
#[derive(Debug, Clone)]
struct SimplexVertex {
    values: Vec<f64>,
    objective: f64,
}

/// Non-finite objectives rank worst
fn evaluate<F: FnMut(&[f64]) -> f64>(objective: &mut F, values: Vec<f64>) -> SimplexVertex {
    let value = objective(&values);
    SimplexVertex {
        objective: if value.is_nan() { f64::INFINITY } else { value },
        values,
    }
}

/// Start vertex plus one vertex per dimension perturbed by a tenth of its range
fn initialize_simplex<F: FnMut(&[f64]) -> f64>(
    objective: &mut F,
    start: &[f64],
    bounds: &[(f64, f64)],
) -> Vec<SimplexVertex> {
    let mut origin = start.to_vec();
    clamp_to_bounds(&mut origin, bounds);

    let mut simplex = Vec::with_capacity(origin.len() + 1);
    for i in 0..origin.len() {
        let mut point = origin.clone();
        let (min, max) = bounds[i];
        let step = INITIAL_STEP * (max - min);

        if point[i] + step <= max {
            point[i] += step;
        } else {
            point[i] -= step;
        }
        simplex.push(evaluate(objective, point));
    }
    simplex.insert(0, evaluate(objective, origin));

    simplex
}

/// Calculate the centroid of all points except the worst
fn centroid(simplex: &[SimplexVertex]) -> Vec<f64> {
    let n = simplex[0].values.len();
    let mut center = vec![0.0; n];

    for vertex in simplex.iter().take(simplex.len() - 1) {
        for (i, val) in vertex.values.iter().enumerate() {
            center[i] += val;
        }
    }

    let count = (simplex.len() - 1) as f64;
    for val in &mut center {
        *val /= count;
    }

    center
}

/// Reflect a point through the centroid
fn reflect(point: &[f64], centroid: &[f64], coef: f64) -> Vec<f64> {
    point
        .iter()
        .zip(centroid.iter())
        .map(|(p, c)| c + coef * (c - p))
        .collect()
}

fn clamp_to_bounds(values: &mut [f64], bounds: &[(f64, f64)]) {
    for (val, (min, max)) in values.iter_mut().zip(bounds.iter()) {
        *val = val.clamp(*min, *max);
    }
}

/// Max distance of any vertex from the centroid
fn simplex_size(simplex: &[SimplexVertex], centroid: &[f64]) -> f64 {
    simplex
        .iter()
        .map(|v| {
            v.values
                .iter()
                .zip(centroid.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .fold(0.0_f64, |a, b| a.max(b))
}

fn sort_simplex(simplex: &mut [SimplexVertex]) {
    simplex.sort_by(|a, b| a.objective.total_cmp(&b.objective));
}

fn has_converged(simplex: &[SimplexVertex], tolerance: f64) -> bool {
    let best = simplex[0].objective;
    let worst = simplex[simplex.len() - 1].objective;
    if best.is_finite() && worst.is_finite() && worst - best <= tolerance * (1.0 + best.abs()) {
        return true;
    }
    simplex_size(simplex, &centroid(simplex)) < tolerance
}

/// Minimize `objective` inside `bounds`, starting from `start`.
///
/// `start` and `bounds` must have the same, non-zero length and every bound
/// must satisfy `min < max`.
pub fn minimize<F>(
    mut objective: F,
    start: &[f64],
    bounds: &[(f64, f64)],
    settings: NelderMeadSettings,
) -> Minimum
where
    F: FnMut(&[f64]) -> f64,
{
    debug_assert_eq!(start.len(), bounds.len());
    debug_assert!(!start.is_empty());

    let mut simplex = initialize_simplex(&mut objective, start, bounds);
    let worst_idx = simplex.len() - 1;
    let mut iteration = 0;
    let mut converged = false;

    while iteration < settings.max_iterations {
        sort_simplex(&mut simplex);
        if has_converged(&simplex, settings.tolerance) {
            converged = true;
            break;
        }
        iteration += 1;

        let cent = centroid(&simplex);
        let best_objective = simplex[0].objective;
        let second_worst_objective = simplex[worst_idx - 1].objective;
        let worst_objective = simplex[worst_idx].objective;
        let worst_values = simplex[worst_idx].values.clone();

        let mut reflected = reflect(&worst_values, &cent, REFLECTION_COEF);
        clamp_to_bounds(&mut reflected, bounds);
        let reflected = evaluate(&mut objective, reflected);

        if reflected.objective < best_objective {
            // Reflected is best so far - try expansion
            let mut expanded = reflect(&worst_values, &cent, EXPANSION_COEF);
            clamp_to_bounds(&mut expanded, bounds);
            let expanded = evaluate(&mut objective, expanded);

            simplex[worst_idx] = if expanded.objective < reflected.objective {
                expanded
            } else {
                reflected
            };
        } else if reflected.objective < second_worst_objective {
            simplex[worst_idx] = reflected;
        } else {
            let contract_point = if reflected.objective < worst_objective {
                &reflected.values
            } else {
                &worst_values
            };

            let mut contracted: Vec<f64> = cent
                .iter()
                .zip(contract_point.iter())
                .map(|(c, p)| c + CONTRACTION_COEF * (p - c))
                .collect();
            clamp_to_bounds(&mut contracted, bounds);
            let contracted = evaluate(&mut objective, contracted);

            if contracted.objective < worst_objective.min(reflected.objective) {
                simplex[worst_idx] = contracted;
            } else {
                // Shrink the simplex toward the best point
                let best_values = simplex[0].values.clone();
                for vertex in simplex.iter_mut().skip(1) {
                    let mut shrunk: Vec<f64> = best_values
                        .iter()
                        .zip(vertex.values.iter())
                        .map(|(b, v)| b + SHRINK_COEF * (v - b))
                        .collect();
                    clamp_to_bounds(&mut shrunk, bounds);
                    *vertex = evaluate(&mut objective, shrunk);
                }
            }
        }
    }

    sort_simplex(&mut simplex);
    if !converged {
        converged = has_converged(&simplex, settings.tolerance);
    }

    let best = simplex.swap_remove(0);
    Minimum {
        point: best.values,
        value: best.objective,
        iterations: iteration,
        converged,
    }
}
