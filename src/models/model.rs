//! `Regressor` capability and the ordinary least squares implementation.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::solve_least_squares;

/// A model that can be fitted on a design matrix and then predict from one.
pub trait Regressor: Sized {
    fn fit(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<Self, AppError>;

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError>;
}

/// Ordinary least squares with an intercept. No regularization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

impl Regressor for LinearRegression {
    /// Centre columns and target, solve the centred system, then recover the
    /// intercept as `ȳ - x̄ᵀβ`. Deterministic for identical inputs.
    fn fit(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<Self, AppError> {
        let (n, m) = x.shape();
        if n != y.len() {
            return Err(AppError::shape(format!(
                "Cannot fit: feature matrix has {n} rows but target has {} values.",
                y.len()
            )));
        }
        if n == 0 {
            return Err(AppError::shape("Cannot fit on zero rows."));
        }

        let n_f = n as f64;
        let x_mean: Vec<f64> = x.column_iter().map(|c| c.sum() / n_f).collect();
        let y_mean = y.sum() / n_f;

        let xc = DMatrix::from_fn(n, m, |i, j| x[(i, j)] - x_mean[j]);
        let yc = y.map(|v| v - y_mean);

        let beta = solve_least_squares(&xc, &yc).ok_or_else(|| {
            AppError::fit(format!("Least squares solve failed for a {n}x{m} design matrix."))
        })?;

        let intercept = y_mean - beta.iter().zip(&x_mean).map(|(b, xm)| b * xm).sum::<f64>();
        if !intercept.is_finite() {
            return Err(AppError::fit("Least squares produced a non-finite intercept."));
        }

        Ok(Self {
            coefficients: beta.iter().copied().collect(),
            intercept,
        })
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
        if x.ncols() != self.n_features() {
            return Err(AppError::shape(format!(
                "Model has {} coefficients but received {} feature columns.",
                self.n_features(),
                x.ncols()
            )));
        }
        Ok(DVector::from_fn(x.nrows(), |i, _| {
            self.intercept
                + x.row(i)
                    .iter()
                    .zip(&self.coefficients)
                    .map(|(v, b)| v * b)
                    .sum::<f64>()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_plane() {
        // y = 1 + 2a - 3b
        let x = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
        let y = DVector::from_row_slice(&[1.0, 3.0, -2.0, -4.0]);

        let model = LinearRegression::fit(&x, &y).unwrap();
        assert!((model.intercept - 1.0).abs() < 1e-10);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-10);
        assert!((model.coefficients[1] + 3.0).abs() < 1e-10);

        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-10);
        }
    }

    #[test]
    fn fit_is_deterministic() {
        let x = DMatrix::from_row_slice(5, 2, &[0.1, 2.0, 0.4, 1.0, 0.9, 0.3, 1.5, 0.7, 2.2, 0.2]);
        let y = DVector::from_row_slice(&[1.0, 0.5, 2.0, 1.7, 3.1]);
        let a = LinearRegression::fit(&x, &y).unwrap();
        let b = LinearRegression::fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn row_mismatch_is_a_shape_error() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let err = LinearRegression::fit(&x, &y).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Shape);
    }

    #[test]
    fn predict_checks_width() {
        let model = LinearRegression {
            coefficients: vec![1.0, 2.0],
            intercept: 0.0,
        };
        let x = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 1.0]);
        assert!(model.predict(&x).is_err());
    }
}
