//! Polynomial feature expansion.
//!
//! For `n` input features and degree `D` the expansion contains every
//! monomial of total degree `0..=D`, i.e. `C(D + n, n)` columns. Columns are
//! graded by total degree; within one total degree the earlier features carry
//! the higher exponents. For two features `[a, b]` and `D = 2`:
//!
//! ```text
//! [1, a, b, a², ab, b²]
//! ```
//!
//! The first column is always the constant (bias) term.

use nalgebra::DMatrix;

use crate::domain::MAX_SUPPORTED_DEGREE;
use crate::error::AppError;

/// A fixed expansion: input width + degree resolved into exponent vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    degree: u32,
    n_features: usize,
    exponents: Vec<Vec<u32>>,
}

impl Expansion {
    pub fn new(n_features: usize, degree: u32) -> Result<Self, AppError> {
        if degree == 0 {
            return Err(AppError::config("Polynomial degree must be >= 1, got 0."));
        }
        if degree > MAX_SUPPORTED_DEGREE {
            return Err(AppError::config(format!(
                "Polynomial degree {degree} exceeds the supported limit of {MAX_SUPPORTED_DEGREE}."
            )));
        }
        if n_features == 0 {
            return Err(AppError::shape("Cannot expand a feature matrix with no columns."));
        }
        Ok(Self {
            degree,
            n_features,
            exponents: monomial_exponents(n_features, degree),
        })
    }

    pub fn degree(&self) -> u32 {
        self.degree
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_output(&self) -> usize {
        self.exponents.len()
    }

    /// One exponent vector (length `n_features`) per output column.
    pub fn exponents(&self) -> &[Vec<u32>] {
        &self.exponents
    }

    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, AppError> {
        if x.ncols() != self.n_features {
            return Err(AppError::shape(format!(
                "Polynomial expansion expects {} input columns, got {}.",
                self.n_features,
                x.ncols()
            )));
        }

        Ok(DMatrix::from_fn(x.nrows(), self.n_output(), |i, k| {
            self.exponents[k]
                .iter()
                .enumerate()
                .map(|(j, &e)| x[(i, j)].powi(e as i32))
                .product()
        }))
    }
}

/// Expand `x` (N×n) into all monomials up to `degree` (N×C(degree+n, n)).
pub fn expand(x: &DMatrix<f64>, degree: u32) -> Result<DMatrix<f64>, AppError> {
    Expansion::new(x.ncols(), degree)?.transform(x)
}

/// Number of output columns for `n_features` inputs at `degree`.
pub fn expanded_len(n_features: usize, degree: u32) -> usize {
    // C(degree + n, n), accumulated so intermediate values stay integral.
    let d = degree as usize;
    (1..=n_features).fold(1usize, |acc, k| acc * (d + k) / k)
}

/// Exponent vectors in expansion order.
pub fn monomial_exponents(n_features: usize, degree: u32) -> Vec<Vec<u32>> {
    let mut out = Vec::with_capacity(expanded_len(n_features, degree));
    let mut current = vec![0u32; n_features];
    for total in 0..=degree {
        push_monomials(n_features, total, 0, &mut current, &mut out);
    }
    out
}

fn push_monomials(
    n_features: usize,
    remaining: u32,
    start: usize,
    current: &mut Vec<u32>,
    out: &mut Vec<Vec<u32>>,
) {
    if remaining == 0 {
        out.push(current.clone());
        return;
    }
    for j in start..n_features {
        current[j] += 1;
        push_monomials(n_features, remaining - 1, j, current, out);
        current[j] -= 1;
    }
}
