//! Dataset preparation: train/validation splits and synthetic data.

pub mod split;
pub mod synth;

pub use split::*;
pub use synth::*;
