//! Per-degree training and evaluation.
//!
//! Responsibilities:
//!
//! - expand + scale + fit one degree (`trainer`)
//! - score predictions against ground truth (`evaluate`)

pub mod evaluate;
pub mod trainer;

pub use evaluate::*;
pub use trainer::*;
