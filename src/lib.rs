//! `poly-sweep` library crate.
//!
//! The binary (`polysweep`) is a thin wrapper around this library so the sweep
//! can be tested without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod sweep;
