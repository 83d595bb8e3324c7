//! Fit one polynomial degree: expand → scale → fit.
//!
//! The fitted expansion, scaler, and model travel together so every later
//! prediction (training report, validation, reloaded bundle) goes through the
//! exact same feature path.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::{Expansion, StandardScaler};
use crate::models::{LinearRegression, Regressor};

/// Everything fitted for one degree.
#[derive(Debug, Clone)]
pub struct TrainedDegree<M = LinearRegression> {
    pub expansion: Expansion,
    pub scaler: StandardScaler,
    pub model: M,
}

impl<M: Regressor> TrainedDegree<M> {
    pub fn degree(&self) -> u32 {
        self.expansion.degree()
    }

    /// Predict from raw (unexpanded) features using the training scaler.
    pub fn predict(&self, x_raw: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
        predict_raw(&self.expansion, &self.scaler, &self.model, x_raw)
    }
}

/// Fit a polynomial model of `degree` on raw features `x` and target `y`.
pub fn train_polynomial<M: Regressor>(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    degree: u32,
) -> Result<TrainedDegree<M>, AppError> {
    if x.nrows() != y.len() {
        return Err(AppError::shape(format!(
            "Training features have {} rows but target has {} values.",
            x.nrows(),
            y.len()
        )));
    }

    let expansion = Expansion::new(x.ncols(), degree)?;
    let x_poly = expansion.transform(x)?;
    let (x_scaled, scaler) = StandardScaler::fit_transform(&x_poly)?;
    let model = M::fit(&x_scaled, y)?;

    tracing::debug!(degree, columns = expansion.n_output(), rows = x.nrows(), "fitted degree");

    Ok(TrainedDegree {
        expansion,
        scaler,
        model,
    })
}

/// Expand, scale with fitted statistics, and predict.
pub fn predict_raw<M: Regressor>(
    expansion: &Expansion,
    scaler: &StandardScaler,
    model: &M,
    x_raw: &DMatrix<f64>,
) -> Result<DVector<f64>, AppError> {
    let x_poly = expansion.transform(x_raw)?;
    let x_scaled = scaler.transform(&x_poly)?;
    model.predict(&x_scaled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic_surface(n: usize) -> (DMatrix<f64>, DVector<f64>) {
        let x = DMatrix::from_fn(n, 2, |i, j| {
            let t = i as f64 / n as f64;
            if j == 0 { 10.0 * t } else { (7.0 * t).sin() }
        });
        let y = DVector::from_fn(n, |i, _| {
            let a = x[(i, 0)];
            let b = x[(i, 1)];
            3.0 + 0.5 * a - 2.0 * b + 0.25 * a * a + a * b
        });
        (x, y)
    }

    #[test]
    fn degree_two_recovers_quadratic_surface() {
        let (x, y) = quadratic_surface(40);
        let trained: TrainedDegree = train_polynomial(&x, &y, 2).unwrap();
        assert_eq!(trained.degree(), 2);
        assert_eq!(trained.scaler.n_features(), 6);

        let pred = trained.predict(&x).unwrap();
        let max_err = pred.iter().zip(y.iter()).map(|(p, t)| (p - t).abs()).fold(0.0, f64::max);
        assert!(max_err < 1e-8, "max error {max_err}");
    }

    #[test]
    fn degree_one_underfits_quadratic_surface() {
        let (x, y) = quadratic_surface(40);
        let trained: TrainedDegree = train_polynomial(&x, &y, 1).unwrap();
        let pred = trained.predict(&x).unwrap();
        let max_err = pred.iter().zip(y.iter()).map(|(p, t)| (p - t).abs()).fold(0.0, f64::max);
        assert!(max_err > 1e-3);
    }

    #[test]
    fn mismatched_target_is_rejected() {
        let (x, _) = quadratic_surface(10);
        let y = DVector::from_element(9, 1.0);
        let err = train_polynomial::<LinearRegression>(&x, &y, 2).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Shape);
    }
}
