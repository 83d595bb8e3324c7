//! Shared domain types.
//!
//! Samples are immutable once loaded; everything the sweep derives from them
//! (expanded matrices, scalers, models) is owned per degree.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Raw input columns, in the order they enter the feature matrix.
pub const FEATURE_COLUMNS: [&str; 2] = ["under_y", "theta"];

/// Target column.
pub const TARGET_COLUMN: &str = "distance";

/// Degrees swept when nothing else is configured.
pub const DEFAULT_MIN_DEGREE: u32 = 1;
pub const DEFAULT_MAX_DEGREE: u32 = 20;

/// Highest degree accepted anywhere. Two features at this degree already
/// expand to 5151 columns.
pub const MAX_SUPPORTED_DEGREE: u32 = 100;

/// One row of input: two features and the measured distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub under_y: f64,
    pub theta: f64,
    pub distance: f64,
}

impl RawSample {
    pub fn features(&self) -> [f64; 2] {
        [self.under_y, self.theta]
    }
}

/// An ordered set of samples. Row position is the only identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub samples: Vec<RawSample>,
}

impl Dataset {
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// N×2 matrix of raw features.
    pub fn feature_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.samples.len(), FEATURE_COLUMNS.len(), |i, j| {
            self.samples[i].features()[j]
        })
    }

    pub fn targets(&self) -> DVector<f64> {
        DVector::from_iterator(self.samples.len(), self.samples.iter().map(|s| s.distance))
    }

    /// The first `n` rows, in their original order.
    pub fn prefix(&self, n: usize) -> Dataset {
        let n = n.min(self.samples.len());
        Dataset::new(self.samples[..n].to_vec())
    }

    /// Per-feature `(min, max)` over the rows, `None` when empty.
    pub fn feature_ranges(&self) -> Option<(Vec<f64>, Vec<f64>)> {
        let first = self.samples.first()?;
        let mut lo = first.features().to_vec();
        let mut hi = lo.clone();
        for s in &self.samples[1..] {
            for (j, v) in s.features().into_iter().enumerate() {
                lo[j] = lo[j].min(v);
                hi[j] = hi[j].max(v);
            }
        }
        Some((lo, hi))
    }
}

/// Inclusive range of polynomial degrees, iterated in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreeRange {
    min: u32,
    max: u32,
}

impl DegreeRange {
    pub fn new(min: u32, max: u32) -> Result<Self, AppError> {
        if min == 0 {
            return Err(AppError::config("Minimum polynomial degree must be >= 1."));
        }
        if min > max {
            return Err(AppError::config(format!(
                "Empty degree range: min degree {min} > max degree {max}."
            )));
        }
        if max > MAX_SUPPORTED_DEGREE {
            return Err(AppError::config(format!(
                "Max degree {max} exceeds the supported limit of {MAX_SUPPORTED_DEGREE}."
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Number of degrees in the range (always at least one).
    pub fn count(&self) -> usize {
        (self.max - self.min + 1) as usize
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u32> {
        self.min..=self.max
    }
}

impl Default for DegreeRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_DEGREE,
            max: DEFAULT_MAX_DEGREE,
        }
    }
}

/// Mean absolute error and root mean squared error for one split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub mae: f64,
    pub rmse: f64,
}

/// Per-degree evaluation on both splits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub degree: u32,
    pub train_mae: f64,
    pub train_rmse: f64,
    pub val_mae: f64,
    pub val_rmse: f64,
}

impl MetricsRecord {
    pub fn new(degree: u32, train: Metrics, val: Metrics) -> Self {
        Self {
            degree,
            train_mae: train.mae,
            train_rmse: train.rmse,
            val_mae: val.mae,
            val_rmse: val.rmse,
        }
    }
}

/// The degree with the lowest validation MAE seen so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestDegree {
    pub degree: u32,
    pub val_mae: f64,
}
