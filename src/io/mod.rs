//! Input/output helpers.
//!
//! - balance log discovery + ingest (`ingest`)
//! - bundle CSV and run manifest exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
