//! Kinetics transform engine.
//!
//! Turns one specimen's raw balance log into a [`KineticsBundle`]:
//!
//! 1. align (drop the pre-onset samples, rebase time, truncate)
//! 2. estimate the plateau from the configured tail
//! 3. derive oxygen fraction, reduction fraction and the rate-law transforms
//!
//! The engine holds no state. Every call returns a freshly owned bundle, or an
//! error; a partially computed bundle is never returned.

use tracing::{debug, warn};

use crate::domain::{
    DomainReport, EngineConfig, KineticsBundle, PlateauWindow, RawSeries, SpecimenRecord,
};
use crate::error::{KineticsError, KineticsResult};

pub mod align;
pub mod plateau;
pub mod transforms;

pub use align::{align, trim_onset, truncate};
pub use plateau::plateau_value;

/// Compute the bundle using the specimen's own onset.
pub fn compute(
    raw: &RawSeries,
    specimen: &SpecimenRecord,
    config: &EngineConfig,
) -> KineticsResult<KineticsBundle> {
    compute_with_offset(raw, specimen, specimen.start_time_s, config)
}

/// Compute the bundle with an explicit onset offset.
pub fn compute_with_offset(
    raw: &RawSeries,
    specimen: &SpecimenRecord,
    start_time_s: usize,
    config: &EngineConfig,
) -> KineticsResult<KineticsBundle> {
    let trimmed = trim_onset(&raw.time, &raw.weight, start_time_s);
    let aligned = truncate(&trimmed, config.max_duration_s);
    if aligned.is_empty() {
        return Err(KineticsError::InsufficientData {
            available: raw.len(),
            start_time_s,
            max_duration_s: config.max_duration_s,
        });
    }

    let plateau_source = match config.plateau_source {
        PlateauWindow::AfterTruncation => &aligned.weight,
        PlateauWindow::BeforeTruncation => &trimmed.weight,
    };
    let plateau = plateau_value(plateau_source, config.plateau_window_len)?;
    debug!(
        specimen = specimen.id,
        samples = aligned.len(),
        plateau,
        source = ?config.plateau_source,
        "aligned series"
    );

    let correction = specimen.reduction_correction_factor;
    let n = aligned.len();

    let mut bundle = KineticsBundle {
        time_s: aligned.time,
        weight: aligned.weight,
        plateau_value: plateau,
        oxygen_fraction: Vec::with_capacity(n),
        reduction_fraction: Vec::with_capacity(n),
        reduction_percent: Vec::with_capacity(n),
        iron_layer_limiting: Vec::with_capacity(n),
        mixed_control_limiting: Vec::with_capacity(n),
        complete_internal_burning: Vec::with_capacity(n),
        external_mass_transfer: Vec::with_capacity(n),
        domain: DomainReport::default(),
    };

    for (&t, &w) in bundle.time_s.iter().zip(&bundle.weight) {
        let f = transforms::reduction_fraction(w, plateau, correction);
        bundle.oxygen_fraction.push(transforms::oxygen_fraction(w, specimen));
        bundle.reduction_fraction.push(f);
        bundle.reduction_percent.push(f * 100.0);
        bundle.iron_layer_limiting.push(transforms::iron_layer_limiting(f));
        bundle.mixed_control_limiting.push(transforms::mixed_control_limiting(f));
        bundle.complete_internal_burning.push(transforms::complete_internal_burning(f));
        bundle.external_mass_transfer.push(transforms::external_mass_transfer(t, specimen));
    }

    bundle.domain = DomainReport {
        iron_layer: count_nan(&bundle.iron_layer_limiting),
        mixed_control: count_nan(&bundle.mixed_control_limiting),
        internal_burning: count_nan(&bundle.complete_internal_burning),
    };
    if bundle.domain.total() > 0 {
        warn!(
            specimen = specimen.id,
            iron_layer = bundle.domain.iron_layer,
            mixed_control = bundle.domain.mixed_control,
            internal_burning = bundle.domain.internal_burning,
            "reduction fraction outside the transform domain; samples flagged undefined"
        );
    }

    Ok(bundle)
}

fn count_nan(values: &[f64]) -> usize {
    values.iter().filter(|v| v.is_nan()).count()
}
