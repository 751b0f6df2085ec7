//! Command-line parsing for the pellet reduction kinetics tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! kinetics and presentation code. Turning arguments into an
//! `AnalysisConfig` happens in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_MAX_DURATION_S, DEFAULT_PLATEAU_WINDOW, DEFAULT_PLOT_WINDOW_S, FitRange, PlateauWindow,
};
use crate::logging::{LogFormat, LogLevel};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pellets", version, about = "Iron-ore pellet reduction kinetics")]
pub struct Cli {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a directory of balance logs: summary, plots, exports.
    Analyze(AnalyzeArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same analysis pipeline as `pellets analyze`, but renders
    /// one figure per transform with all specimens overlaid.
    Tui(TuiArgs),
    /// List the specimen table.
    Specimens(SpecimensArgs),
    /// Write synthetic balance logs, one per specimen.
    Synth(SynthArgs),
}

/// Logging options, accepted before or after the subcommand.
#[derive(Debug, Args, Clone)]
pub struct LogArgs {
    /// Minimum log level (overridden by RUST_LOG).
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Options shared by `analyze` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// Directory of balance logs (*.txt). Defaults to $PELLETS_DATA_DIR, then `.`.
    #[arg(short = 'd', long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Specimen table (JSON) replacing the built-in one.
    #[arg(long, value_name = "JSON")]
    pub specimens: Option<PathBuf>,

    /// Linear fit overlay on a y-value window, e.g. `reduction=0.4:0.5`.
    /// Repeatable.
    #[arg(long = "fit", value_name = "SERIES=MIN:MAX")]
    pub fits: Vec<FitRange>,

    /// Tail samples used for the plateau median.
    #[arg(long, default_value_t = DEFAULT_PLATEAU_WINDOW)]
    pub plateau_window: usize,

    /// Take the plateau tail before or after truncation.
    #[arg(long, value_enum, default_value_t = PlateauWindow::AfterTruncation)]
    pub plateau_source: PlateauWindow,

    /// Samples kept after the onset.
    #[arg(long, default_value_t = DEFAULT_MAX_DURATION_S)]
    pub max_duration: usize,

    /// Samples shown on plots and used for fits.
    #[arg(long, default_value_t = DEFAULT_PLOT_WINDOW_S)]
    pub plot_window: usize,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Render ASCII overlays of every figure in the terminal.
    #[arg(long)]
    pub ascii: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Write one SVG figure per transform into DIR.
    #[arg(long, value_name = "DIR")]
    pub svg: Option<PathBuf>,

    /// Write per-specimen CSVs and a JSON manifest into DIR.
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Directory for figures (`s`) and exports (`e`). Defaults to a
    /// timestamped `pellets_export_*` directory.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SpecimensArgs {
    /// Specimen table (JSON) replacing the built-in one.
    #[arg(long, value_name = "JSON")]
    pub specimens: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output directory.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Specimen table (JSON) replacing the built-in one.
    #[arg(long, value_name = "JSON")]
    pub specimens: Option<PathBuf>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Reading noise standard deviation (g).
    #[arg(long, default_value_t = 0.002)]
    pub noise: f64,

    /// Samples logged after the onset.
    #[arg(long, default_value_t = 6600)]
    pub tail: usize,

    /// Probability of a balance spike on any sample.
    #[arg(long, default_value_t = 0.0005)]
    pub spike_prob: f64,
}
