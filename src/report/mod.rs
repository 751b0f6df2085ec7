//! Reporting utilities: per-specimen summaries and formatted terminal output.

use crate::app::pipeline::SpecimenAnalysis;

mod format;

pub use format::*;

/// Headline numbers of one analyzed specimen.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecimenSummary {
    pub specimen_id: u32,
    pub label: String,
    pub samples: usize,
    pub plateau_value: f64,
    /// Reduction fraction of the last aligned sample.
    pub final_fraction: f64,
    /// First time (min) the reduction fraction reaches one half.
    pub half_time_min: Option<f64>,
    pub undefined_samples: usize,
}

impl SpecimenSummary {
    pub fn from_analysis(a: &SpecimenAnalysis) -> Self {
        let b = &a.bundle;
        let half_time_min = b
            .time_s
            .iter()
            .zip(&b.reduction_fraction)
            .find(|&(_, &f)| f >= 0.5)
            .map(|(&t, _)| t / 60.0);

        Self {
            specimen_id: a.specimen.id,
            label: a.specimen.display_label.clone(),
            samples: b.len(),
            plateau_value: b.plateau_value,
            final_fraction: b.reduction_fraction.last().copied().unwrap_or(f64::NAN),
            half_time_min,
            undefined_samples: b.domain.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainReport, KineticsBundle};
    use crate::registry::SpecimenRegistry;

    #[test]
    fn summary_finds_half_reduction_time() {
        let specimen = SpecimenRegistry::builtin().lookup(5).unwrap().clone();
        let f = vec![0.0, 0.2, 0.49, 0.51, 0.9];
        let bundle = KineticsBundle {
            time_s: vec![0.0, 60.0, 120.0, 180.0, 240.0],
            weight: f.clone(),
            plateau_value: 1.0,
            oxygen_fraction: f.clone(),
            reduction_fraction: f.clone(),
            reduction_percent: f.iter().map(|v| v * 100.0).collect(),
            iron_layer_limiting: f.clone(),
            mixed_control_limiting: f.clone(),
            complete_internal_burning: f.clone(),
            external_mass_transfer: f,
            domain: DomainReport {
                iron_layer: 1,
                mixed_control: 2,
                internal_burning: 3,
            },
        };
        let analysis = SpecimenAnalysis {
            specimen,
            bundle,
            fits: Vec::new(),
            fit_failures: Vec::new(),
        };

        let s = SpecimenSummary::from_analysis(&analysis);
        assert_eq!(s.specimen_id, 5);
        assert_eq!(s.half_time_min, Some(3.0));
        assert_eq!(s.final_fraction, 0.9);
        assert_eq!(s.undefined_samples, 6);
    }
}
