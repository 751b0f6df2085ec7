//! `pellet-kinetics` library crate.
//!
//! The binary (`pellets`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the registry and engine are reusable outside the CLI (notebooks, other tools)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod kinetics;
pub mod logging;
pub mod math;
pub mod plot;
pub mod registry;
pub mod report;
pub mod tui;
