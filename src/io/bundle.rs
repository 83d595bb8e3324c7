//! Model bundle persistence.
//!
//! A bundle is the portable record of one swept degree: fitted model, fitted
//! scaler, degree, and metrics, plus the raw input ranges seen in training.
//! Bundles are pretty-printed JSON; floats round-trip exactly, so a reloaded
//! bundle reproduces the original predictions bit for bit.
//!
//! File names encode the degree and the validation MAE:
//! `polynomial_degree{D}_mae{MAE:.2}.json`. Saving the same name twice
//! replaces the earlier file.

use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::domain::{BestDegree, Dataset, FEATURE_COLUMNS, MetricsRecord};
use crate::error::AppError;
use crate::fit::{TrainedDegree, predict_raw};
use crate::math::{Expansion, StandardScaler};
use crate::models::LinearRegression;

pub const BUNDLE_PREFIX: &str = "polynomial_degree";
pub const BUNDLE_EXTENSION: &str = "json";

/// Persisted artifact for one degree. Never mutated after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub degree: u32,
    pub model: LinearRegression,
    pub scaler: StandardScaler,
    pub train_mae: f64,
    pub train_rmse: f64,
    pub val_mae: f64,
    pub val_rmse: f64,
    /// Raw input columns, in feature-matrix order.
    pub feature_names: Vec<String>,
    /// Per-feature minimum over the training rows.
    pub input_min: Vec<f64>,
    /// Per-feature maximum over the training rows.
    pub input_max: Vec<f64>,
    pub created_at: DateTime<Utc>,
}

impl ModelBundle {
    pub fn new(trained: &TrainedDegree, record: &MetricsRecord, training: &Dataset) -> Self {
        let width = FEATURE_COLUMNS.len();
        let (input_min, input_max) = training
            .feature_ranges()
            .unwrap_or_else(|| (vec![f64::NAN; width], vec![f64::NAN; width]));
        Self {
            degree: record.degree,
            model: trained.model.clone(),
            scaler: trained.scaler.clone(),
            train_mae: record.train_mae,
            train_rmse: record.train_rmse,
            val_mae: record.val_mae,
            val_rmse: record.val_rmse,
            feature_names: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            input_min,
            input_max,
            created_at: Utc::now(),
        }
    }

    pub fn file_name(&self) -> String {
        bundle_filename(self.degree, self.val_mae)
    }

    pub fn metrics(&self) -> MetricsRecord {
        MetricsRecord {
            degree: self.degree,
            train_mae: self.train_mae,
            train_rmse: self.train_rmse,
            val_mae: self.val_mae,
            val_rmse: self.val_rmse,
        }
    }

    /// Rebuild the expansion and check it agrees with the stored parameters.
    pub fn expansion(&self) -> Result<Expansion, AppError> {
        let expansion = Expansion::new(self.feature_names.len(), self.degree)?;
        let m = expansion.n_output();
        if self.scaler.mean.len() != m || self.scaler.scale.len() != m || self.model.n_features() != m {
            return Err(AppError::shape(format!(
                "Bundle for degree {} expects {m} features but stores scaler={}/{} and model={}.",
                self.degree,
                self.scaler.mean.len(),
                self.scaler.scale.len(),
                self.model.n_features()
            )));
        }
        Ok(expansion)
    }

    /// Predict from raw features with the stored scaler and model.
    pub fn predict(&self, x_raw: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
        let expansion = self.expansion()?;
        predict_raw(&expansion, &self.scaler, &self.model, x_raw)
    }
}

/// `polynomial_degree{degree}_mae{val_mae:.2}.json`
pub fn bundle_filename(degree: u32, val_mae: f64) -> String {
    format!("{BUNDLE_PREFIX}{degree}_mae{val_mae:.2}.{BUNDLE_EXTENSION}")
}

/// Extract the degree from a bundle file name, or `None` if the name does not
/// follow the bundle pattern. Matching is on the parsed integer, so degree 1
/// never matches `polynomial_degree12_...`.
pub fn parse_bundle_degree(file_name: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(BUNDLE_PREFIX)?;
    let rest = rest.strip_suffix(BUNDLE_EXTENSION)?.strip_suffix('.')?;
    let (degree, mae) = rest.split_once("_mae")?;
    if degree.is_empty() || !degree.bytes().all(|b| b.is_ascii_digit()) || mae.is_empty() {
        return None;
    }
    degree.parse().ok()
}

/// Write `bundle` into `dir` (created if absent). Returns the file path.
pub fn save_bundle(bundle: &ModelBundle, dir: &Path) -> Result<PathBuf, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::persistence(format!("Failed to create model dir '{}': {e}", dir.display())))?;

    let path = dir.join(bundle.file_name());
    let file = File::create(&path)
        .map_err(|e| AppError::persistence(format!("Failed to create bundle '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, bundle)
        .map_err(|e| AppError::persistence(format!("Failed to write bundle '{}': {e}", path.display())))?;
    writer
        .flush()
        .map_err(|e| AppError::persistence(format!("Failed to write bundle '{}': {e}", path.display())))?;

    Ok(path)
}

/// Read a bundle written by `save_bundle`.
pub fn load_bundle(path: &Path) -> Result<ModelBundle, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::persistence(format!("Failed to open bundle '{}': {e}", path.display())))?;
    let bundle: ModelBundle = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::persistence(format!("Invalid bundle '{}': {e}", path.display())))?;
    Ok(bundle)
}

/// Find the bundle for `degree` in `dir`. Candidates are checked in sorted
/// name order; `Ok(None)` means no file carries that degree.
pub fn find_bundle_for_degree(dir: &Path, degree: u32) -> Result<Option<PathBuf>, AppError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AppError::persistence(format!("Failed to list model dir '{}': {e}", dir.display())))?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();

    Ok(names
        .into_iter()
        .find(|name| parse_bundle_degree(name) == Some(degree))
        .map(|name| dir.join(name)))
}

/// Find the bundle a run saved for `best`. The exact file name for its degree
/// and MAE wins; otherwise fall back to [`find_bundle_for_degree`].
pub fn locate_best_bundle(dir: &Path, best: &BestDegree) -> Result<Option<PathBuf>, AppError> {
    let exact = dir.join(bundle_filename(best.degree, best.val_mae));
    if exact.is_file() {
        return Ok(Some(exact));
    }
    find_bundle_for_degree(dir, best.degree)
}
