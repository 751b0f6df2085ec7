//! Shared domain types.
//!
//! These types are kept plain and serializable so they can be:
//!
//! - passed between the registry, the engine and the presentation layer
//! - exported to JSON/CSV
//! - rebuilt from a specimen table file

use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Iron mass fraction of the ore (hematite stoichiometry).
pub const IRON_FRACTION: f64 = 0.699436;
/// Oxygen mass fraction of the ore (hematite stoichiometry).
pub const OXYGEN_FRACTION: f64 = 0.300564;
/// Gangue mass fraction, excluded before the iron/oxygen split.
pub const GANGUE_FRACTION: f64 = 0.04;

/// Samples in the tail used for the plateau median.
pub const DEFAULT_PLATEAU_WINDOW: usize = 3 * 60;
/// Samples kept after the onset.
pub const DEFAULT_MAX_DURATION_S: usize = 100 * 60;
/// Samples shown on plots (and used by fit overlays).
pub const DEFAULT_PLOT_WINDOW_S: usize = 25 * 60;

/// Presentation colour of a specimen curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayColor {
    Blue,
    Orange,
    Red,
    Brown,
    Green,
    Purple,
    Pink,
    Gray,
    Black,
}

impl DisplayColor {
    pub fn name(self) -> &'static str {
        match self {
            DisplayColor::Blue => "blue",
            DisplayColor::Orange => "orange",
            DisplayColor::Red => "red",
            DisplayColor::Brown => "brown",
            DisplayColor::Green => "green",
            DisplayColor::Purple => "purple",
            DisplayColor::Pink => "pink",
            DisplayColor::Gray => "gray",
            DisplayColor::Black => "black",
        }
    }

    /// CSS colour of the same name.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            DisplayColor::Blue => (0, 0, 255),
            DisplayColor::Orange => (255, 165, 0),
            DisplayColor::Red => (255, 0, 0),
            DisplayColor::Brown => (165, 42, 42),
            DisplayColor::Green => (0, 128, 0),
            DisplayColor::Purple => (128, 0, 128),
            DisplayColor::Pink => (255, 105, 180),
            DisplayColor::Gray => (128, 128, 128),
            DisplayColor::Black => (0, 0, 0),
        }
    }
}

/// Immutable physical descriptor of one pellet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenRecord {
    /// Registry key, also encoded in source file names.
    pub id: u32,
    /// Pre-reduction mass (g).
    pub initial_mass: f64,
    /// Sample index of the reaction onset; earlier samples are discarded.
    pub start_time_s: usize,
    /// XRD calibration applied to the plateau-normalized fraction.
    pub reduction_correction_factor: f64,
    /// Initial pellet radius (m).
    pub initial_radius: f64,
    pub display_color: DisplayColor,
    pub display_label: String,
    /// Parameters are estimates, not campaign measurements.
    #[serde(default)]
    pub provisional: bool,
}

impl SpecimenRecord {
    /// Iron mass in the pellet (g).
    pub fn iron_mass(&self) -> f64 {
        self.initial_mass * (1.0 - GANGUE_FRACTION) * IRON_FRACTION
    }

    /// Removable oxygen mass in the pellet (g).
    pub fn oxygen_mass(&self) -> f64 {
        self.initial_mass * (1.0 - GANGUE_FRACTION) * OXYGEN_FRACTION
    }
}

/// Raw `(time_s, weight_g)` samples of one specimen, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSeries {
    pub time: Vec<f64>,
    pub weight: Vec<f64>,
}

impl RawSeries {
    pub fn new(time: Vec<f64>, weight: Vec<f64>) -> crate::error::KineticsResult<Self> {
        if time.len() != weight.len() {
            return Err(crate::error::KineticsError::LengthMismatch {
                x: time.len(),
                y: weight.len(),
            });
        }
        Ok(Self { time, weight })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// A raw series after onset trimming, time rebasing and truncation.
///
/// Time values start at 0 for the first retained sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedSeries {
    pub time: Vec<f64>,
    pub weight: Vec<f64>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Which tail the plateau median is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlateauWindow {
    /// Tail of the aligned and truncated series.
    #[default]
    AfterTruncation,
    /// Tail of the aligned series before truncation to the experiment duration.
    BeforeTruncation,
}

/// Engine settings shared by every specimen of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub plateau_window_len: usize,
    pub max_duration_s: usize,
    pub plateau_source: PlateauWindow,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            plateau_window_len: DEFAULT_PLATEAU_WINDOW,
            max_duration_s: DEFAULT_MAX_DURATION_S,
            plateau_source: PlateauWindow::AfterTruncation,
        }
    }
}

/// Named series of a [`KineticsBundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesKind {
    OxygenFraction,
    Reduction,
    ReductionPercent,
    IronLayer,
    MixedControl,
    InternalBurning,
    ExternalMassTransfer,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 7] = [
        SeriesKind::OxygenFraction,
        SeriesKind::Reduction,
        SeriesKind::ReductionPercent,
        SeriesKind::IronLayer,
        SeriesKind::MixedControl,
        SeriesKind::InternalBurning,
        SeriesKind::ExternalMassTransfer,
    ];

    /// Series that get their own comparison figure.
    pub const FIGURES: [SeriesKind; 5] = [
        SeriesKind::Reduction,
        SeriesKind::IronLayer,
        SeriesKind::MixedControl,
        SeriesKind::InternalBurning,
        SeriesKind::ExternalMassTransfer,
    ];

    /// Stable identifier (CLI value, export column, file name).
    pub fn key(self) -> &'static str {
        match self {
            SeriesKind::OxygenFraction => "oxygen-fraction",
            SeriesKind::Reduction => "reduction",
            SeriesKind::ReductionPercent => "reduction-percent",
            SeriesKind::IronLayer => "iron-layer",
            SeriesKind::MixedControl => "mixed-control",
            SeriesKind::InternalBurning => "internal-burning",
            SeriesKind::ExternalMassTransfer => "external-mass-transfer",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SeriesKind::OxygenFraction => "Oxygen in pellet",
            SeriesKind::Reduction => "Reduction fraction",
            SeriesKind::ReductionPercent => "Reduction (%)",
            SeriesKind::IronLayer => "Iron layer diffusion control",
            SeriesKind::MixedControl => "Mixed control",
            SeriesKind::InternalBurning => "Complete internal burning",
            SeriesKind::ExternalMassTransfer => "External mass transfer control",
        }
    }

    pub fn axis_label(self) -> &'static str {
        match self {
            SeriesKind::OxygenFraction => "O/(O+Fe)",
            SeriesKind::Reduction => "F",
            SeriesKind::ReductionPercent => "F (%)",
            SeriesKind::IronLayer => "1/2 - F/3 - (1-F)^(2/3)/2",
            SeriesKind::MixedControl => "1 - (1-F)^(1/3)",
            SeriesKind::InternalBurning => "ln(1-F)",
            SeriesKind::ExternalMassTransfer => "X_ext",
        }
    }
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-transform count of samples flagged undefined (NaN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainReport {
    pub iron_layer: usize,
    pub mixed_control: usize,
    pub internal_burning: usize,
}

impl DomainReport {
    pub fn total(&self) -> usize {
        self.iron_layer + self.mixed_control + self.internal_burning
    }
}

/// All derived series of one specimen, aligned 1:1 with `time_s`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticsBundle {
    pub time_s: Vec<f64>,
    pub weight: Vec<f64>,
    pub plateau_value: f64,
    pub oxygen_fraction: Vec<f64>,
    pub reduction_fraction: Vec<f64>,
    pub reduction_percent: Vec<f64>,
    pub iron_layer_limiting: Vec<f64>,
    pub mixed_control_limiting: Vec<f64>,
    pub complete_internal_burning: Vec<f64>,
    pub external_mass_transfer: Vec<f64>,
    pub domain: DomainReport,
}

impl KineticsBundle {
    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }

    pub fn series(&self, kind: SeriesKind) -> &[f64] {
        match kind {
            SeriesKind::OxygenFraction => &self.oxygen_fraction,
            SeriesKind::Reduction => &self.reduction_fraction,
            SeriesKind::ReductionPercent => &self.reduction_percent,
            SeriesKind::IronLayer => &self.iron_layer_limiting,
            SeriesKind::MixedControl => &self.mixed_control_limiting,
            SeriesKind::InternalBurning => &self.complete_internal_burning,
            SeriesKind::ExternalMassTransfer => &self.external_mass_transfer,
        }
    }
}

/// A y-value window on one series, used to select samples for a linear fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitRange {
    pub series: SeriesKind,
    pub min: f64,
    pub max: f64,
}

impl FromStr for FitRange {
    type Err = String;

    /// Parse `SERIES=MIN:MAX`, e.g. `reduction=0.4:0.5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (series, bounds) = s
            .split_once('=')
            .ok_or_else(|| format!("Invalid fit range '{s}': expected SERIES=MIN:MAX"))?;
        let series = <SeriesKind as ValueEnum>::from_str(series.trim(), true)
            .map_err(|_| format!("Invalid fit range '{s}': unknown series '{}'", series.trim()))?;
        let (min, max) = bounds
            .split_once(':')
            .ok_or_else(|| format!("Invalid fit range '{s}': expected MIN:MAX after '='"))?;
        let min: f64 = min
            .trim()
            .parse()
            .map_err(|_| format!("Invalid fit range '{s}': bad minimum '{}'", min.trim()))?;
        let max: f64 = max
            .trim()
            .parse()
            .map_err(|_| format!("Invalid fit range '{s}': bad maximum '{}'", max.trim()))?;
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(format!("Invalid fit range '{s}': need finite MIN <= MAX"));
        }
        Ok(FitRange { series, min, max })
    }
}

/// Linear fit over the samples of one series that fall inside a [`FitRange`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFit {
    pub range: FitRange,
    /// Slope per second of elapsed time.
    pub slope: f64,
    pub intercept: f64,
    /// Fitted `(time_s, y)` over the selected samples.
    pub points: Vec<(f64, f64)>,
}

impl SeriesFit {
    /// Legend suffix appended to the specimen label.
    pub fn legend_suffix(&self) -> String {
        format!(
            "\nRange:[{} - {}] Slope = {:.4}",
            self.range.min, self.range.max, self.slope
        )
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and `.env`).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub specimens_path: Option<PathBuf>,
    pub engine: EngineConfig,
    pub plot_window_s: usize,
    pub fit_ranges: Vec<FitRange>,
}

impl AnalysisConfig {
    pub fn validate(&self) -> crate::error::KineticsResult<()> {
        use crate::error::KineticsError;

        if self.engine.plateau_window_len == 0 {
            return Err(KineticsError::Config("plateau window must be > 0 samples".to_string()));
        }
        if self.engine.max_duration_s == 0 {
            return Err(KineticsError::Config("max duration must be > 0 samples".to_string()));
        }
        if self.plot_window_s == 0 {
            return Err(KineticsError::Config("plot window must be > 0 samples".to_string()));
        }
        for r in &self.fit_ranges {
            if !(r.min.is_finite() && r.max.is_finite()) || r.min > r.max {
                return Err(KineticsError::Config(format!(
                    "fit range on {} must satisfy min <= max (got {}..{})",
                    r.series, r.min, r.max
                )));
            }
        }
        Ok(())
    }
}
