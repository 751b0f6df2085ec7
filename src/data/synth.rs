//! Synthetic balance logs for registry specimens.
//!
//! Each log mimics a thermobalance run: a tared idle phase up to the onset,
//! then a mass-loss curve following chemically controlled shrinking-core
//! kinetics, `F(t) = 1 - (1 - t/τ)^3`, levelling off at the removable oxygen
//! mass. Gaussian reading noise and occasional balance spikes are added.
//!
//! Logs are written in the ingest format so they can be analyzed end to end.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::info;

use crate::domain::{RawSeries, SpecimenRecord};
use crate::error::{KineticsError, KineticsResult};
use crate::registry::SpecimenRegistry;

/// Share of the oxygen mass removed when the run levels off.
const FINAL_EXTENT: f64 = 0.97;
/// Reduction time of the largest pellet (s); scales with radius.
const TAU_REF_S: f64 = 2400.0;
const RADIUS_REF_M: f64 = 0.00855;
/// Furnace set point written to the temperature column (°C).
const FURNACE_C: f64 = 950.0;

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub seed: u64,
    /// Standard deviation of the reading noise (g).
    pub noise_g: f64,
    /// Samples logged after the onset.
    pub tail_s: usize,
    /// Probability of a spike on any sample.
    pub spike_prob: f64,
    /// Spike magnitude (g).
    pub spike_g: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            noise_g: 0.002,
            tail_s: 6600,
            spike_prob: 0.0005,
            spike_g: 0.05,
        }
    }
}

/// File name carrying the specimen id at characters 12-13.
pub fn synthetic_file_name(specimen_id: u32) -> String {
    format!("pellet_test_{specimen_id:02}.txt")
}

/// Noise-free mass loss (g) at `t` seconds after the onset.
pub fn ideal_mass_loss(specimen: &SpecimenRecord, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    let tau = TAU_REF_S * specimen.initial_radius / RADIUS_REF_M;
    let x = (t / tau).min(1.0);
    let f = 1.0 - (1.0 - x).powi(3);
    specimen.oxygen_mass() * FINAL_EXTENT * f
}

/// Generate one synthetic run with `(onset + tail)` per-second samples.
pub fn generate_series(specimen: &SpecimenRecord, config: &SynthConfig) -> KineticsResult<RawSeries> {
    validate(config)?;

    let mut rng = StdRng::seed_from_u64(series_seed(config.seed, specimen.id));
    let normal = Normal::new(0.0, config.noise_g)
        .map_err(|e| KineticsError::Config(format!("noise distribution error: {e}")))?;

    let n = specimen.start_time_s + config.tail_s;
    let mut time = Vec::with_capacity(n);
    let mut weight = Vec::with_capacity(n);

    for i in 0..n {
        let t = i as f64 - specimen.start_time_s as f64;
        let mut w = ideal_mass_loss(specimen, t) + normal.sample(&mut rng);
        if rng.gen_bool(config.spike_prob) {
            w += if rng.gen_bool(0.5) { config.spike_g } else { -config.spike_g };
        }
        time.push(i as f64);
        weight.push(w);
    }

    RawSeries::new(time, weight)
}

/// Write one synthetic log per registry specimen into `dir`.
pub fn write_synthetic_logs(
    registry: &SpecimenRegistry,
    dir: &Path,
    config: &SynthConfig,
) -> KineticsResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| KineticsError::io(dir, e))?;

    let mut written = Vec::with_capacity(registry.len());
    for specimen in registry.iter() {
        let series = generate_series(specimen, config)?;
        let path = dir.join(synthetic_file_name(specimen.id));
        write_log(&path, &series, config.seed ^ u64::from(specimen.id))?;
        info!(specimen = specimen.id, path = %path.display(), samples = series.len(), "wrote synthetic log");
        written.push(path);
    }
    Ok(written)
}

fn write_log(path: &Path, series: &RawSeries, temp_seed: u64) -> KineticsResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let mut rng = StdRng::seed_from_u64(temp_seed);
    writer
        .write_record(["Time(s)", "Weight", "Temperature(C)"])
        .map_err(|e| csv_error(path, e))?;
    for (t, w) in series.time.iter().zip(&series.weight) {
        let temp = FURNACE_C + rng.gen_range(-1.5..1.5);
        writer
            .write_record([format!("{t:.0}"), format!("{w:.5}"), format!("{temp:.1}")])
            .map_err(|e| csv_error(path, e))?;
    }
    writer.flush().map_err(|e| KineticsError::io(path, e))?;
    Ok(())
}

fn csv_error(path: &Path, err: csv::Error) -> KineticsError {
    KineticsError::io(path, std::io::Error::other(err))
}

fn validate(config: &SynthConfig) -> KineticsResult<()> {
    if !(config.noise_g.is_finite() && config.noise_g >= 0.0) {
        return Err(KineticsError::Config("synthetic noise must be finite and >= 0".to_string()));
    }
    if !(0.0..=1.0).contains(&config.spike_prob) {
        return Err(KineticsError::Config("spike probability must be within [0, 1]".to_string()));
    }
    if config.tail_s == 0 {
        return Err(KineticsError::Config("synthetic tail must be > 0 samples".to_string()));
    }
    Ok(())
}

fn series_seed(seed: u64, specimen_id: u32) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    specimen_id.hash(&mut hasher);
    hasher.finish()
}
