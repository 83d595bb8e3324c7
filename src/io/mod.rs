//! Input/output helpers.
//!
//! - CSV ingest + schema validation (`ingest`)
//! - model bundle save/load and lookup (`bundle`)
//! - sweep summary CSV (`export`)
//! - C source export of a bundle (`embedded`)

pub mod bundle;
pub mod embedded;
pub mod export;
pub mod ingest;

pub use bundle::*;
pub use embedded::*;
pub use export::*;
pub use ingest::*;
