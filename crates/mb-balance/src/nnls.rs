//! Lower-bounded linear least squares.
//!
//! `min ||A x - b||` subject to `x >= lb`, solved as a non-negative least
//! squares problem in the shifted variable `y = x - lb` with the Lawson-Hanson
//! active-set method. Passive-set subproblems are solved through an SVD so
//! rank-deficient stock sets (duplicate or proportional stocks) stay stable.

use crate::error::{BalanceError, BalanceResult};
use nalgebra::{DMatrix, DVector};

/// Active-set solver configuration.
#[derive(Debug, Clone)]
pub struct LsqConfig {
    /// Outer iterations allowed per variable; the cap is `max(iterations_per_var * n, min_iterations)`.
    pub iterations_per_var: usize,
    /// Floor for the iteration cap.
    pub min_iterations: usize,
    /// Multiplier on `eps * ||A|| * max(m, n)` for the optimality tolerance.
    pub tol_factor: f64,
}

impl Default for LsqConfig {
    fn default() -> Self {
        Self {
            iterations_per_var: 3,
            min_iterations: 50,
            tol_factor: 10.0,
        }
    }
}

/// Bounded least-squares result.
#[derive(Debug, Clone)]
pub struct LsqSolution {
    /// Solution vector, every entry `>= lb`
    pub x: DVector<f64>,
    /// `true` where the lower bound is active
    pub at_lower: Vec<bool>,
    /// Final residual norm `||A x - b||`
    pub residual_norm: f64,
    /// Number of outer iterations
    pub iterations: usize,
}

/// Solve `min ||A x - b||` subject to `x >= lb`.
pub fn bounded_lsq(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    lb: &DVector<f64>,
    config: &LsqConfig,
) -> BalanceResult<LsqSolution> {
    if a.nrows() != b.len() || a.ncols() != lb.len() {
        return Err(BalanceError::SolverFailure {
            what: format!(
                "dimension mismatch: A is {}x{}, b has {}, lb has {}",
                a.nrows(),
                a.ncols(),
                b.len(),
                lb.len()
            ),
        });
    }
    if a.iter().chain(b.iter()).chain(lb.iter()).any(|v| !v.is_finite()) {
        return Err(BalanceError::SolverFailure {
            what: "non-finite entry in least-squares data".to_string(),
        });
    }

    let shifted = b - a * lb;
    let (y, passive, iterations) = nnls(a, &shifted, config)?;

    let x = y + lb;
    let residual_norm = (a * &x - b).norm();
    Ok(LsqSolution {
        x,
        at_lower: passive.iter().map(|p| !p).collect(),
        residual_norm,
        iterations,
    })
}

/// Lawson-Hanson NNLS. Returns the solution, the passive set and the iteration count.
fn nnls(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    config: &LsqConfig,
) -> BalanceResult<(DVector<f64>, Vec<bool>, usize)> {
    let (m, n) = a.shape();
    let max_iterations = (config.iterations_per_var * n).max(config.min_iterations);
    let tol = config.tol_factor * f64::EPSILON * a.norm() * m.max(n) as f64;

    let mut x = DVector::zeros(n);
    let mut passive = vec![false; n];
    // Variables whose entry produced a non-positive subproblem value; skipped
    // until the passive set changes.
    let mut blocked = vec![false; n];
    let mut iterations = 0;

    loop {
        let w = a.transpose() * (b - a * &x);
        let candidate = (0..n)
            .filter(|&j| !passive[j] && !blocked[j])
            .max_by(|&i, &j| w[i].total_cmp(&w[j]));
        let t = match candidate {
            Some(t) if w[t] > tol => t,
            _ => break,
        };

        iterations += 1;
        if iterations > max_iterations {
            return Err(BalanceError::SolverFailure {
                what: format!("least squares did not converge in {max_iterations} iterations"),
            });
        }

        passive[t] = true;
        let mut z = solve_passive(a, b, &passive)?;
        if z[t] <= tol {
            passive[t] = false;
            blocked[t] = true;
            continue;
        }
        blocked.fill(false);

        // Step back towards the feasible region until every passive entry is positive.
        let mut inner = 0;
        while (0..n).any(|j| passive[j] && z[j] <= tol) {
            inner += 1;
            if inner > max_iterations {
                return Err(BalanceError::SolverFailure {
                    what: "least squares inner loop did not terminate".to_string(),
                });
            }

            let alpha = (0..n)
                .filter(|&j| passive[j] && z[j] <= tol)
                .map(|j| x[j] / (x[j] - z[j]))
                .fold(f64::INFINITY, f64::min);

            x += alpha * (&z - &x);
            for j in 0..n {
                if passive[j] && x[j] <= tol {
                    passive[j] = false;
                    x[j] = 0.0;
                }
            }
            z = solve_passive(a, b, &passive)?;
        }
        x = z;
    }

    Ok((x, passive, iterations))
}

/// Unconstrained least squares over the passive columns; zero elsewhere.
fn solve_passive(a: &DMatrix<f64>, b: &DVector<f64>, passive: &[bool]) -> BalanceResult<DVector<f64>> {
    let cols: Vec<usize> = (0..passive.len()).filter(|&j| passive[j]).collect();
    let mut z = DVector::zeros(passive.len());
    if cols.is_empty() {
        return Ok(z);
    }

    let sub = a.select_columns(&cols);
    let sub_z = sub
        .svd(true, true)
        .solve(b, f64::EPSILON * 1e3)
        .map_err(|e| BalanceError::SolverFailure {
            what: format!("SVD solve failed: {e}"),
        })?;

    for (k, &j) in cols.iter().enumerate() {
        z[j] = sub_z[k];
    }
    Ok(z)
}
