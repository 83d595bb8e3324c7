//! Explicit sweep configuration.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::data::{DEFAULT_SPLIT_SEED, DEFAULT_TEST_SIZE, validate_ratio};
use crate::domain::DegreeRange;
use crate::error::AppError;

pub const DEFAULT_MODELS_ROOT: &str = "models";
pub const DEFAULT_RESULTS_ROOT: &str = "results";

/// Everything one sweep depends on. The run is a function of this value plus
/// the files it names.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepContext {
    pub train_path: PathBuf,
    pub val_path: PathBuf,
    /// Fraction of the training rows kept, taken as a prefix.
    pub train_ratio: f64,
    pub degrees: DegreeRange,
    /// Shuffle seed when train and validation share one file.
    pub seed: u64,
    /// Validation fraction when train and validation share one file.
    pub test_size: f64,
    pub models_root: PathBuf,
    pub results_root: PathBuf,
    /// Output subdirectory name, `YYYYMMDD_HHMMSS` by default.
    pub run_id: String,
    pub plots: bool,
}

impl SweepContext {
    pub fn new(train_path: impl Into<PathBuf>, val_path: impl Into<PathBuf>) -> Self {
        Self {
            train_path: train_path.into(),
            val_path: val_path.into(),
            train_ratio: 1.0,
            degrees: DegreeRange::default(),
            seed: DEFAULT_SPLIT_SEED,
            test_size: DEFAULT_TEST_SIZE,
            models_root: PathBuf::from(DEFAULT_MODELS_ROOT),
            results_root: PathBuf::from(DEFAULT_RESULTS_ROOT),
            run_id: run_timestamp(),
            plots: true,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_ratio(self.train_ratio)?;
        if !(self.test_size.is_finite() && self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(AppError::config(format!(
                "Test size must be strictly between 0 and 1, got {}.",
                self.test_size
            )));
        }
        if self.run_id.is_empty() || self.run_id.contains(['/', '\\']) {
            return Err(AppError::config(format!("Invalid run id '{}'.", self.run_id)));
        }
        Ok(())
    }

    pub fn model_dir(&self) -> PathBuf {
        self.models_root.join(&self.run_id)
    }

    pub fn result_dir(&self) -> PathBuf {
        self.results_root.join(&self.run_id)
    }

    /// True when training and validation come from the same file.
    pub fn shares_source(&self) -> bool {
        same_file(&self.train_path, &self.val_path)
    }
}

/// Local time as `YYYYMMDD_HHMMSS`.
pub fn run_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
