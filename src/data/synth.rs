//! Synthetic measurement generator.
//!
//! Produces `(under_y, theta, distance)` rows from a smooth camera-like
//! surface (distance falls off with the image row and bends with the angle)
//! plus Gaussian noise. Output depends only on the configuration.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Dataset, RawSample};
use crate::error::AppError;

/// Image-row range (pixels).
const UNDER_Y_RANGE: (f64, f64) = (0.0, 480.0);
/// Angle range (degrees).
const THETA_RANGE: (f64, f64) = (-30.0, 30.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    pub rows: usize,
    pub seed: u64,
    /// Standard deviation of the additive noise on `distance`.
    pub noise: f64,
}

/// Noise-free distance for a given row and angle.
pub fn distance_surface(under_y: f64, theta: f64) -> f64 {
    let t = theta.to_radians();
    15.0 + 4000.0 / (under_y + 80.0) * (1.0 + 0.15 * t * t) - 0.01 * under_y * t
}

pub fn generate_dataset(config: &SynthConfig) -> Result<Dataset, AppError> {
    if config.rows == 0 {
        return Err(AppError::config("Synthetic row count must be > 0."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::config(format!(
            "Noise must be a finite, non-negative standard deviation, got {}.",
            config.noise
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;

    let samples = (0..config.rows)
        .map(|_| {
            let under_y = rng.gen_range(UNDER_Y_RANGE.0..=UNDER_Y_RANGE.1);
            let theta = rng.gen_range(THETA_RANGE.0..=THETA_RANGE.1);
            let distance = distance_surface(under_y, theta) + normal.sample(&mut rng);
            RawSample {
                under_y,
                theta,
                distance,
            }
        })
        .collect();

    Ok(Dataset::new(samples))
}
