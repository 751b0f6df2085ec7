//! Data sources that are not files on disk.
//!
//! Currently: seeded synthetic balance logs (`synth`) for demos and tests.

pub mod synth;

pub use synth::*;
