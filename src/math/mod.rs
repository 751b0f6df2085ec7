//! Mathematical utilities: least squares fitting and order statistics.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
