//! Shared analysis pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! discover -> resolve specimen -> ingest -> compute bundle -> fit overlays
//!
//! Each source is processed independently (in parallel via rayon). A failing
//! source becomes a failed [`SpecimenOutcome`]; it never aborts the others.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::domain::{AnalysisConfig, FitRange, KineticsBundle, SeriesFit, SpecimenRecord};
use crate::error::{AppError, KineticsError, KineticsResult};
use crate::io::ingest::{discover_sources, read_raw_series, source_name};
use crate::kinetics;
use crate::math::fit_in_range;
use crate::registry::SpecimenRegistry;

/// Computed outputs of one successfully analyzed source.
#[derive(Debug)]
pub struct SpecimenAnalysis {
    pub specimen: SpecimenRecord,
    pub bundle: KineticsBundle,
    pub fits: Vec<SeriesFit>,
    /// Fit ranges that could not be fitted (e.g. fewer than two samples inside).
    pub fit_failures: Vec<(FitRange, KineticsError)>,
}

/// Result of one source file.
#[derive(Debug)]
pub struct SpecimenOutcome {
    pub source: PathBuf,
    pub source_name: String,
    pub result: Result<SpecimenAnalysis, KineticsError>,
}

/// All computed outputs of a single run.
#[derive(Debug)]
pub struct RunOutput {
    pub config: AnalysisConfig,
    /// One outcome per source, in source (file name) order.
    pub outcomes: Vec<SpecimenOutcome>,
}

impl RunOutput {
    pub fn successes(&self) -> impl Iterator<Item = (&SpecimenOutcome, &SpecimenAnalysis)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|a| (o, a)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SpecimenOutcome, &KineticsError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o, e)))
    }
}

/// Registry from a JSON table if given, else the built-in table.
pub fn load_registry(path: Option<&Path>) -> KineticsResult<SpecimenRegistry> {
    match path {
        Some(p) => {
            let registry = SpecimenRegistry::from_json_path(p)?;
            info!(path = %p.display(), specimens = registry.len(), "loaded specimen table");
            Ok(registry)
        }
        None => Ok(SpecimenRegistry::builtin()),
    }
}

/// Execute the full analysis over every source in `config.data_dir`.
pub fn run_analysis(config: &AnalysisConfig, registry: &SpecimenRegistry) -> Result<RunOutput, AppError> {
    config.validate()?;

    let sources = discover_sources(&config.data_dir)?;
    if sources.is_empty() {
        return Err(AppError::new(
            3,
            format!(
                "No balance logs (*.txt) found in '{}'",
                config.data_dir.display()
            ),
        ));
    }
    info!(dir = %config.data_dir.display(), sources = sources.len(), "starting analysis");

    let outcomes: Vec<SpecimenOutcome> = sources
        .par_iter()
        .map(|path| analyze_source(path, registry, config))
        .collect();

    for outcome in &outcomes {
        match &outcome.result {
            Ok(a) => info!(
                source = %outcome.source_name,
                specimen = a.specimen.id,
                samples = a.bundle.len(),
                plateau = a.bundle.plateau_value,
                fits = a.fits.len(),
                "analyzed specimen"
            ),
            Err(e) => error!(source = %outcome.source_name, kind = e.kind().label(), "{e}"),
        }
    }

    let run = RunOutput {
        config: config.clone(),
        outcomes,
    };

    if run.successes().next().is_none() {
        let first = run
            .failures()
            .next()
            .map(|(o, e)| format!("{}: {e}", o.source_name))
            .unwrap_or_default();
        return Err(AppError::new(
            3,
            format!("All {} specimens failed (first: {first})", run.outcomes.len()),
        ));
    }

    Ok(run)
}

/// Analyze one source file end to end.
pub fn analyze_source(path: &Path, registry: &SpecimenRegistry, config: &AnalysisConfig) -> SpecimenOutcome {
    let name = source_name(path);
    let result = analyze_named(path, &name, registry, config);
    SpecimenOutcome {
        source: path.to_path_buf(),
        source_name: name,
        result,
    }
}

fn analyze_named(
    path: &Path,
    name: &str,
    registry: &SpecimenRegistry,
    config: &AnalysisConfig,
) -> KineticsResult<SpecimenAnalysis> {
    let specimen = registry.lookup_by_source_name(name)?.clone();
    if specimen.provisional {
        warn!(source = name, specimen = specimen.id, "specimen parameters are provisional");
    }
    let raw = read_raw_series(path)?;
    let bundle = kinetics::compute(&raw, &specimen, &config.engine)?;

    let (fits, fit_failures) = fit_overlays(&bundle, &config.fit_ranges, config.plot_window_s);
    for (range, err) in &fit_failures {
        warn!(source = name, series = %range.series, min = range.min, max = range.max, "skipped fit: {err}");
    }

    Ok(SpecimenAnalysis {
        specimen,
        bundle,
        fits,
        fit_failures,
    })
}

/// Fit every range over the first `window` samples of the bundle.
pub fn fit_overlays(
    bundle: &KineticsBundle,
    ranges: &[FitRange],
    window: usize,
) -> (Vec<SeriesFit>, Vec<(FitRange, KineticsError)>) {
    let n = bundle.len().min(window);
    let time = &bundle.time_s[..n];

    let mut fits = Vec::new();
    let mut failures = Vec::new();
    for &range in ranges {
        let values = &bundle.series(range.series)[..n];
        match fit_in_range(time, values, range) {
            Ok(fit) => fits.push(fit),
            Err(e) => failures.push((range, e)),
        }
    }
    (fits, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synth::{SynthConfig, write_synthetic_logs};
    use crate::domain::{EngineConfig, SeriesKind, DEFAULT_PLOT_WINDOW_S};
    use std::fs;

    fn config(dir: &Path, fit_ranges: Vec<FitRange>) -> AnalysisConfig {
        AnalysisConfig {
            data_dir: dir.to_path_buf(),
            specimens_path: None,
            engine: EngineConfig::default(),
            plot_window_s: DEFAULT_PLOT_WINDOW_S,
            fit_ranges,
        }
    }

    fn quiet() -> SynthConfig {
        SynthConfig {
            noise_g: 0.0,
            spike_prob: 0.0,
            ..SynthConfig::default()
        }
    }

    #[test]
    fn synthetic_run_analyzes_every_specimen_with_fits() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SpecimenRegistry::builtin();
        write_synthetic_logs(&registry, dir.path(), &quiet()).unwrap();

        let ranges = vec![
            "reduction=0.2:0.5".parse().unwrap(),
            "mixed-control=0.1:0.2".parse().unwrap(),
        ];
        let run = run_analysis(&config(dir.path(), ranges), &registry).unwrap();

        assert_eq!(run.outcomes.len(), registry.len());
        assert_eq!(run.failures().count(), 0);
        for (_, a) in run.successes() {
            assert_eq!(a.fits.len(), 2, "specimen {}", a.specimen.id);
            assert!(a.fits[0].slope > 0.0);
            assert_eq!(a.fits[0].range.series, SeriesKind::Reduction);
        }

        // Outcomes keep source order.
        let names: Vec<&str> = run.outcomes.iter().map(|o| o.source_name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn bad_source_does_not_abort_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SpecimenRegistry::builtin();
        write_synthetic_logs(&registry, dir.path(), &quiet()).unwrap();
        // Id 03 has no registry entry; id 01 is overwritten with garbage.
        fs::write(dir.path().join("pellet_test_03.txt"), "t\tw\n0\t1\n").unwrap();
        fs::write(dir.path().join("pellet_test_01.txt"), "t\tw\n0\tabc\n").unwrap();

        let run = run_analysis(&config(dir.path(), Vec::new()), &registry).unwrap();
        let failed: Vec<(&str, &str)> = run
            .failures()
            .map(|(o, e)| (o.source_name.as_str(), e.kind().label()))
            .collect();
        assert_eq!(
            failed,
            vec![("pellet_test_01", "data format"), ("pellet_test_03", "configuration")]
        );
        assert_eq!(run.successes().count(), registry.len() - 1);
    }

    #[test]
    fn fit_window_without_samples_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SpecimenRegistry::builtin();
        write_synthetic_logs(&registry, dir.path(), &quiet()).unwrap();

        let ranges = vec!["reduction=5:6".parse().unwrap()];
        let run = run_analysis(&config(dir.path(), ranges), &registry).unwrap();
        for (_, a) in run.successes() {
            assert!(a.fits.is_empty());
            assert!(matches!(a.fit_failures[0].1, KineticsError::TooFewPoints(0)));
        }
    }

    #[test]
    fn empty_directory_exits_with_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_analysis(&config(dir.path(), Vec::new()), &SpecimenRegistry::builtin()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn all_failed_run_exits_with_no_data() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pellet_test_03.txt"), "t\tw\n0\t1\n").unwrap();
        let err = run_analysis(&config(dir.path(), Vec::new()), &SpecimenRegistry::builtin()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("pellet_test_03"));
    }

    #[test]
    fn fit_overlays_only_see_the_plot_window() {
        let registry = SpecimenRegistry::builtin();
        let s = registry.lookup(9).unwrap();
        let series = crate::data::synth::generate_series(s, &quiet()).unwrap();
        let bundle = kinetics::compute(&series, s, &EngineConfig::default()).unwrap();

        // Late samples sit on the plateau (F ~ 1) and fall outside a 10 s window.
        let range: FitRange = "reduction=0.99:1.0".parse().unwrap();
        let (fits, failures) = fit_overlays(&bundle, &[range], 10);
        assert!(fits.is_empty());
        assert_eq!(failures.len(), 1);
        let (fits, _) = fit_overlays(&bundle, &[range], bundle.len());
        assert_eq!(fits.len(), 1);
    }
}
