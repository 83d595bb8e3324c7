//! Degree sweep orchestration.
//!
//! `Init → Loading → {Fitting → Evaluating → Persisting}(degree)* →
//! Summarizing → BestModelReplot → Done`, driven by an explicit
//! `SweepContext`. Degrees run strictly in increasing order; the best degree
//! is the first one reaching the lowest validation MAE.

pub mod best;
pub mod context;
pub mod controller;

pub use best::*;
pub use context::*;
pub use controller::*;
