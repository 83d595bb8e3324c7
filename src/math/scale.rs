//! Standard scaling (zero mean, unit variance) over expanded feature columns.
//!
//! A scaler is fitted on training data only and then applied unchanged to
//! every other matrix of the same expansion. Scalers are never shared across
//! degrees: different degrees produce different column sets.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Fitted per-column mean and scale (population standard deviation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics.
    ///
    /// Constant columns (the bias column, or a degenerate input) get scale
    /// `1.0`, so they are centred to zero instead of divided by zero.
    pub fn fit(x: &DMatrix<f64>) -> Result<Self, AppError> {
        let n = x.nrows();
        if n == 0 {
            return Err(AppError::shape("Cannot fit a scaler on zero rows."));
        }
        let n_f = n as f64;

        let mut mean = Vec::with_capacity(x.ncols());
        let mut scale = Vec::with_capacity(x.ncols());
        for col in x.column_iter() {
            let m = col.iter().sum::<f64>() / n_f;
            let var = col.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / n_f;

            let constant_bound = n_f * f64::EPSILON * m;
            let s = if var <= constant_bound * constant_bound || !var.is_finite() || var == 0.0 {
                1.0
            } else {
                var.sqrt()
            };
            mean.push(m);
            scale.push(s);
        }

        Ok(Self { mean, scale })
    }

    pub fn fit_transform(x: &DMatrix<f64>) -> Result<(DMatrix<f64>, Self), AppError> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaled, scaler))
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Apply the fitted statistics to `x`. Never refits.
    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, AppError> {
        if x.ncols() != self.n_features() || self.scale.len() != self.n_features() {
            return Err(AppError::shape(format!(
                "Scaler was fitted on {} columns but received {}.",
                self.n_features(),
                x.ncols()
            )));
        }
        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            (x[(i, j)] - self.mean[j]) / self.scale[j]
        }))
    }
}

/// Fit a scaler on `x` and return the scaled matrix with it.
pub fn scale(x: &DMatrix<f64>) -> Result<(DMatrix<f64>, StandardScaler), AppError> {
    StandardScaler::fit_transform(x)
}

/// Scale `x` with a previously fitted scaler.
pub fn apply_scale(x: &DMatrix<f64>, scaler: &StandardScaler) -> Result<DMatrix<f64>, AppError> {
    scaler.transform(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::expand;

    fn input() -> DMatrix<f64> {
        DMatrix::from_row_slice(4, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 35.0, 4.0, 50.0])
    }

    #[test]
    fn scaled_columns_have_zero_mean_unit_variance() {
        let (scaled, _) = scale(&input()).unwrap();
        for col in scaled.column_iter() {
            let m = col.iter().sum::<f64>() / 4.0;
            let var = col.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / 4.0;
            assert!(m.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn reapplying_fitted_state_reproduces_scaled_exactly() {
        let poly = expand(&input(), 3).unwrap();
        let (scaled, scaler) = scale(&poly).unwrap();
        let again = apply_scale(&poly, &scaler).unwrap();
        assert_eq!(scaled, again);
    }

    #[test]
    fn bias_column_is_centred_not_divided() {
        let poly = expand(&input(), 2).unwrap();
        let (scaled, scaler) = scale(&poly).unwrap();
        assert_eq!(scaler.mean[0], 1.0);
        assert_eq!(scaler.scale[0], 1.0);
        assert!(scaled.column(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn uses_training_statistics_on_new_data() {
        let (_, scaler) = scale(&input()).unwrap();
        let other = DMatrix::from_row_slice(1, 2, &[2.5, 28.75]);
        let out = apply_scale(&other, &scaler).unwrap();
        assert!(out[(0, 0)].abs() < 1e-12);
        assert!(out[(0, 1)].abs() < 1e-12);
    }

    #[test]
    fn column_mismatch_is_a_shape_error() {
        let (_, scaler) = scale(&input()).unwrap();
        let wrong = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        assert_eq!(
            apply_scale(&wrong, &scaler).unwrap_err().kind(),
            crate::error::ErrorKind::Shape
        );
    }

    #[test]
    fn empty_matrix_cannot_be_fitted() {
        let empty = DMatrix::<f64>::zeros(0, 2);
        assert!(StandardScaler::fit(&empty).is_err());
    }
}
