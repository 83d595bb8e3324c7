//! Least squares solver.
//!
//! Every degree of the sweep solves one problem of the form
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD handles tall and wide design matrices alike. Degree 20 on two inputs
//!   yields 231 columns, which can exceed the number of training rows.
//! - Singular values below `max(n, m) · ε · σ_max` are treated as zero, so
//!   collinear or constant columns get the minimum-norm solution.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)

use nalgebra::{DMatrix, DVector};

/// Absolute fallback cutoffs tried after the relative one.
const FALLBACK_TOLERANCES: [f64; 2] = [1e-10, 1e-8];

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no cutoff yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.ncols() == 0 {
        return None;
    }

    let svd = x.clone().svd(true, true);
    let sigma_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let relative = sigma_max * (x.nrows().max(x.ncols()) as f64) * f64::EPSILON;

    // Start from the relative cutoff; loosen only if the strict solve fails.
    let fallbacks = FALLBACK_TOLERANCES.iter().copied().filter(|&t| t > relative);
    let tolerances = std::iter::once(relative).chain(fallbacks);
    for tol in tolerances {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
