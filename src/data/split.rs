//! Train/validation splitting and training-set subsampling.
//!
//! Both operations are deterministic: the split is a seeded shuffle, and the
//! subsample is a prefix of the training rows in their existing order.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::Dataset;
use crate::error::AppError;

/// Fraction of rows held out when one file serves both roles.
pub const DEFAULT_TEST_SIZE: f64 = 0.3;

/// Seed of the split shuffle.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Split `data` into `(train, validation)` with a seeded shuffle.
///
/// The validation side gets `ceil(test_size · n)` rows: the first shuffled
/// indices go to validation, the rest to training.
pub fn train_test_split(data: &Dataset, test_size: f64, seed: u64) -> Result<(Dataset, Dataset), AppError> {
    if !(test_size.is_finite() && test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::config(format!(
            "Test size must be strictly between 0 and 1, got {test_size}."
        )));
    }

    let n = data.len();
    let n_test = (test_size * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(AppError::shape(format!(
            "Cannot split {n} rows with test size {test_size}: one side would be empty."
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let pick = |idx: &[usize]| Dataset::new(idx.iter().map(|&i| data.samples[i]).collect());
    let validation = pick(&indices[..n_test]);
    let train = pick(&indices[n_test..]);

    Ok((train, validation))
}

/// Keep the leading `floor(len · ratio)` rows.
pub fn subsample_prefix(data: &Dataset, ratio: f64) -> Result<Dataset, AppError> {
    validate_ratio(ratio)?;
    let n = (data.len() as f64 * ratio).floor() as usize;
    if n == 0 {
        return Err(AppError::shape(format!(
            "Training ratio {ratio} leaves no rows out of {}.",
            data.len()
        )));
    }
    Ok(data.prefix(n))
}

pub fn validate_ratio(ratio: f64) -> Result<(), AppError> {
    if !(ratio.is_finite() && (0.0..=1.0).contains(&ratio)) {
        return Err(AppError::config(format!(
            "Training ratio must be within 0.0..=1.0, got {ratio}."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawSample;

    fn numbered(n: usize) -> Dataset {
        Dataset::new(
            (0..n)
                .map(|i| RawSample {
                    under_y: i as f64,
                    theta: 0.0,
                    distance: 0.0,
                })
                .collect(),
        )
    }

    fn ids(data: &Dataset) -> Vec<usize> {
        data.samples.iter().map(|s| s.under_y as usize).collect()
    }

    #[test]
    fn split_is_seventy_thirty_and_partitions_rows() {
        let data = numbered(100);
        let (train, val) = train_test_split(&data, DEFAULT_TEST_SIZE, DEFAULT_SPLIT_SEED).unwrap();
        assert_eq!(train.len(), 70);
        assert_eq!(val.len(), 30);

        let mut all = ids(&train);
        all.extend(ids(&val));
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_reproducible_for_a_seed() {
        let data = numbered(50);
        let a = train_test_split(&data, 0.3, 42).unwrap();
        let b = train_test_split(&data, 0.3, 42).unwrap();
        assert_eq!(a, b);

        let c = train_test_split(&data, 0.3, 7).unwrap();
        assert_ne!(ids(&a.1), ids(&c.1));
    }

    #[test]
    fn validation_side_rounds_up() {
        let (train, val) = train_test_split(&numbered(11), 0.3, 1).unwrap();
        assert_eq!(val.len(), 4);
        assert_eq!(train.len(), 7);
    }

    #[test]
    fn tiny_inputs_cannot_be_split() {
        assert!(train_test_split(&numbered(1), 0.3, 42).is_err());
        assert!(train_test_split(&numbered(10), 1.0, 42).is_err());
    }

    #[test]
    fn half_ratio_keeps_first_half_in_order() {
        let sub = subsample_prefix(&numbered(100), 0.5).unwrap();
        assert_eq!(ids(&sub), (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn ratio_bounds() {
        assert_eq!(subsample_prefix(&numbered(10), 1.0).unwrap().len(), 10);
        assert_eq!(subsample_prefix(&numbered(10), 0.0).unwrap_err().kind(), crate::error::ErrorKind::Shape);
        assert_eq!(subsample_prefix(&numbered(10), 1.5).unwrap_err().kind(), crate::error::ErrorKind::Config);
        assert!(validate_ratio(f64::NAN).is_err());
    }
}
