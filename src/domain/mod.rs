//! Domain types shared by the loader, the sweep, the artifact store, and the
//! reports.

pub mod types;

pub use types::*;
