//! Formatted terminal output for the sweep and its subcommands.
//!
//! Formatting lives here so the sweep and fitting code stays free of
//! presentation concerns, and output changes stay localized.

use std::path::Path;

use crate::domain::{BestDegree, MetricsRecord};
use crate::sweep::{BestReplot, Splits};

/// Header printed once the training and validation data are loaded.
pub fn format_split_summary(splits: &Splits) -> String {
    let mut out = String::new();
    out.push_str("=== polysweep - polynomial degree sweep ===\n");
    if splits.shared_source {
        out.push_str("Source: one file, seeded train/validation split\n");
    }
    out.push_str(&format!(
        "Training rows: {} of {}\n",
        splits.train.len(),
        splits.train_full_len
    ));
    out.push_str(&format!("Validation rows: {}", splits.validation.len()));
    out
}

/// One line per fitted degree.
pub fn format_degree_line(record: &MetricsRecord) -> String {
    format!(
        "Degree {:>2} | Train MAE: {:.2}, RMSE: {:.2} | Validation MAE: {:.2}, RMSE: {:.2}",
        record.degree, record.train_mae, record.train_rmse, record.val_mae, record.val_rmse
    )
}

pub fn format_summary_written(path: &Path) -> String {
    format!("MAE results saved to {}", path.display())
}

pub fn format_best(best: &BestDegree) -> String {
    format!(
        "\nBest polynomial degree: {}\nBest validation MAE: {:.2}",
        best.degree, best.val_mae
    )
}

/// Outcome of the final best-model validation pass.
pub fn format_best_replot(replot: Option<&BestReplot>, best_degree: u32) -> String {
    match replot {
        Some(r) => {
            let mut out = format!(
                "Reloaded {} | Validation MAE: {:.2}, RMSE: {:.2}",
                r.bundle_path.display(),
                r.metrics.mae,
                r.metrics.rmse
            );
            if let Some((pred, res)) = &r.plots {
                out.push_str(&format!("\nPlots: {}, {}", pred.display(), res.display()));
            }
            out
        }
        None => format!("No saved model found for degree {best_degree}; final plots skipped."),
    }
}

pub fn format_prediction(under_y: f64, theta: f64, degree: u32, distance: f64) -> String {
    format!("under_y={under_y} theta={theta} -> distance={distance:.4} (degree {degree})")
}
