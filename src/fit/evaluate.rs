//! Prediction scoring.

use crate::domain::Metrics;
use crate::error::AppError;

/// `mae = mean(|y - ŷ|)`, `rmse = sqrt(mean((y - ŷ)²))` over paired values.
pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> Result<Metrics, AppError> {
    if y_true.len() != y_pred.len() {
        return Err(AppError::shape(format!(
            "Cannot evaluate {} predictions against {} targets.",
            y_pred.len(),
            y_true.len()
        )));
    }
    if y_true.is_empty() {
        return Err(AppError::shape("Cannot evaluate an empty prediction set."));
    }

    let n = y_true.len() as f64;
    let (abs_sum, sq_sum) = y_true
        .iter()
        .zip(y_pred)
        .fold((0.0, 0.0), |(abs_sum, sq_sum), (t, p)| {
            let r = t - p;
            (abs_sum + r.abs(), sq_sum + r * r)
        });

    Ok(Metrics {
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
    })
}

/// `actual - predicted`, element-wise.
pub fn residuals(y_true: &[f64], y_pred: &[f64]) -> Vec<f64> {
    y_true.iter().zip(y_pred).map(|(t, p)| t - p).collect()
}
