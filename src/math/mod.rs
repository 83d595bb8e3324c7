//! Numerical building blocks: polynomial expansion, standard scaling, and
//! least squares.

pub mod ols;
pub mod poly;
pub mod scale;

pub use ols::*;
pub use poly::*;
pub use scale::*;
