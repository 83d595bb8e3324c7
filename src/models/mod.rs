//! Trainable regression models.
//!
//! The sweep only needs ordinary least squares, but it talks to the model
//! through the `Regressor` capability so the feature path (expand + scale)
//! and the model family compose independently.

pub mod model;

pub use model::*;
