//! CSV exports.
//!
//! - the sweep summary: one row per degree, in sweep order, with columns
//!   `degree,val_mae`. Training metrics stay in the bundles and the console
//!   report.
//! - datasets, in the same schema `ingest` reads.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{Dataset, MetricsRecord};
use crate::error::AppError;

pub const SUMMARY_FILE_NAME: &str = "mae_results.csv";

#[derive(Serialize)]
struct SummaryRow {
    degree: u32,
    val_mae: f64,
}

/// Write the `degree,val_mae` summary to `path`.
pub fn write_mae_csv(path: &Path, records: &[MetricsRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::persistence(format!("Failed to create summary CSV '{}': {e}", path.display())))?;
    // Header is written explicitly so an empty sweep still yields a valid file.
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    writer
        .write_record(["degree", "val_mae"])
        .map_err(|e| AppError::persistence(format!("Failed to write summary CSV header: {e}")))?;
    for r in records {
        writer
            .serialize(SummaryRow {
                degree: r.degree,
                val_mae: r.val_mae,
            })
            .map_err(|e| AppError::persistence(format!("Failed to write summary CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::persistence(format!("Failed to flush summary CSV '{}': {e}", path.display())))?;

    Ok(())
}

/// Write `data` as `under_y,theta,distance` rows.
pub fn write_dataset_csv(path: &Path, data: &Dataset) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::persistence(format!("Failed to create dataset CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    for sample in &data.samples {
        writer
            .serialize(sample)
            .map_err(|e| AppError::persistence(format!("Failed to write dataset CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::persistence(format!("Failed to flush dataset CSV '{}': {e}", path.display())))?;
    Ok(())
}
