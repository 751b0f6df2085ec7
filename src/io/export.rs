//! Export computed bundles to CSV and a JSON run manifest.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts:
//!
//! - `<source>_kinetics.csv`: one row per aligned sample, one column per series;
//!   undefined samples are empty cells
//! - `manifest.json`: run settings, per-specimen summaries and failures

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use crate::app::pipeline::{RunOutput, SpecimenAnalysis};
use crate::domain::{DomainReport, EngineConfig, FitRange, KineticsBundle, SeriesKind};
use crate::error::{KineticsError, KineticsResult};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Default export directory name, stamped with local time.
pub fn default_export_dir() -> PathBuf {
    PathBuf::from(format!("pellets_export_{}", Local::now().format("%Y%m%d_%H%M%S")))
}

pub fn bundle_csv_name(source_name: &str) -> String {
    format!("{source_name}_kinetics.csv")
}

/// Write one bundle as CSV.
pub fn write_bundle_csv(path: &Path, bundle: &KineticsBundle) -> KineticsResult<()> {
    let file = File::create(path).map_err(|e| KineticsError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_bundle_rows(&mut out, bundle).map_err(|e| KineticsError::io(path, e))?;
    out.flush().map_err(|e| KineticsError::io(path, e))
}

fn write_bundle_rows(out: &mut impl Write, bundle: &KineticsBundle) -> std::io::Result<()> {
    write!(out, "time_s,time_min,weight")?;
    for kind in SeriesKind::ALL {
        write!(out, ",{}", kind.key())?;
    }
    writeln!(out)?;

    for i in 0..bundle.len() {
        let t = bundle.time_s[i];
        write!(out, "{t},{:.6},{}", t / 60.0, bundle.weight[i])?;
        for kind in SeriesKind::ALL {
            write!(out, ",{}", cell(bundle.series(kind)[i]))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn cell(v: f64) -> String {
    if v.is_finite() { format!("{v:.10}") } else { String::new() }
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    tool: &'static str,
    generated_at: DateTime<Local>,
    data_dir: &'a Path,
    engine: EngineConfig,
    plot_window_s: usize,
    fit_ranges: &'a [FitRange],
    specimens: Vec<ManifestSpecimen<'a>>,
    failures: Vec<ManifestFailure<'a>>,
}

#[derive(Debug, Serialize)]
struct ManifestSpecimen<'a> {
    source: &'a str,
    csv: String,
    specimen_id: u32,
    label: &'a str,
    samples: usize,
    plateau_value: f64,
    undefined_samples: DomainReport,
    fits: Vec<ManifestFit>,
}

#[derive(Debug, Serialize)]
struct ManifestFit {
    range: FitRange,
    slope: f64,
    intercept: f64,
    points: usize,
}

#[derive(Debug, Serialize)]
struct ManifestFailure<'a> {
    source: &'a str,
    kind: &'static str,
    message: String,
}

/// Write every successful bundle plus the manifest into `dir`.
///
/// Returns the written paths, manifest last.
pub fn write_run_exports(dir: &Path, run: &RunOutput) -> KineticsResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| KineticsError::io(dir, e))?;

    let mut written = Vec::new();
    let mut specimens = Vec::new();
    for (outcome, analysis) in run.successes() {
        let csv = bundle_csv_name(&outcome.source_name);
        let path = dir.join(&csv);
        write_bundle_csv(&path, &analysis.bundle)?;
        written.push(path);
        specimens.push(manifest_specimen(&outcome.source_name, csv, analysis));
    }

    let failures = run
        .failures()
        .map(|(o, e)| ManifestFailure {
            source: &o.source_name,
            kind: e.kind().label(),
            message: e.to_string(),
        })
        .collect();

    let manifest = Manifest {
        tool: "pellets",
        generated_at: Local::now(),
        data_dir: &run.config.data_dir,
        engine: run.config.engine,
        plot_window_s: run.config.plot_window_s,
        fit_ranges: &run.config.fit_ranges,
        specimens,
        failures,
    };

    let path = dir.join(MANIFEST_FILE);
    let file = File::create(&path).map_err(|e| KineticsError::io(&path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &manifest)
        .map_err(|e| KineticsError::io(&path, std::io::Error::other(e)))?;
    out.flush().map_err(|e| KineticsError::io(&path, e))?;
    written.push(path);

    info!(dir = %dir.display(), files = written.len(), "wrote exports");
    Ok(written)
}

fn manifest_specimen<'a>(source: &'a str, csv: String, a: &'a SpecimenAnalysis) -> ManifestSpecimen<'a> {
    ManifestSpecimen {
        source,
        csv,
        specimen_id: a.specimen.id,
        label: &a.specimen.display_label,
        samples: a.bundle.len(),
        plateau_value: a.bundle.plateau_value,
        undefined_samples: a.bundle.domain,
        fits: a
            .fits
            .iter()
            .map(|f| ManifestFit {
                range: f.range,
                slope: f.slope,
                intercept: f.intercept,
                points: f.points.len(),
            })
            .collect(),
    }
}
