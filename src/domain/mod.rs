//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - specimen descriptors (`SpecimenRecord`, `DisplayColor`)
//! - raw and aligned measurement series (`RawSeries`, `AlignedSeries`)
//! - engine settings (`EngineConfig`, `PlateauWindow`)
//! - engine outputs (`KineticsBundle`, `SeriesKind`, `DomainReport`)
//! - fit overlays (`FitRange`, `SeriesFit`)

pub mod types;

pub use types::*;
