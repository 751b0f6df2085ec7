//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - runs the analysis pipeline
//! - prints reports/plots and writes optional figures and exports

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{AnalysisArgs, AnalyzeArgs, Command, LogArgs, SpecimensArgs, SynthArgs};
use crate::data::synth::{SynthConfig, write_synthetic_logs};
use crate::domain::{AnalysisConfig, EngineConfig, SeriesKind};
use crate::error::AppError;
use crate::logging::{LogConfig, LogSink, init_logging};

pub mod pipeline;

/// Environment variable naming the default data directory.
pub const DATA_DIR_ENV: &str = "PELLETS_DATA_DIR";

const SUBCOMMANDS: [&str; 4] = ["analyze", "tui", "specimens", "synth"];
const GLOBAL_VALUE_FLAGS: [&str; 3] = ["--log-level", "--log-format", "--log-file"];

/// Entry point for the `pellets` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();

    // We want `pellets` and `pellets --fit ...` to behave like `pellets tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let log = log_config_from_args(&cli.log);
    match cli.command {
        Command::Analyze(args) => {
            init_logging(&log)?;
            handle_analyze(args)
        }
        Command::Tui(args) => {
            init_logging(&log.for_terminal_ui())?;
            crate::tui::run(args)
        }
        Command::Specimens(args) => {
            init_logging(&log)?;
            handle_specimens(args)
        }
        Command::Synth(args) => {
            init_logging(&log)?;
            handle_synth(args)
        }
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis);
    let registry = pipeline::load_registry(config.specimens_path.as_deref())?;
    let run = pipeline::run_analysis(&config, &registry)?;

    println!("{}", crate::report::format_run_summary(&run));

    if args.ascii {
        for kind in SeriesKind::FIGURES {
            let plot = crate::plot::ascii::render_figure(&run, kind, config.plot_window_s, args.width, args.height);
            println!("{plot}");
        }
    }

    if let Some(dir) = &args.svg {
        let written = crate::plot::svg::write_figures(dir, &run, config.plot_window_s)?;
        println!("Wrote {} figure(s) to {}", written.len(), dir.display());
    }
    if let Some(dir) = &args.export {
        let written = crate::io::export::write_run_exports(dir, &run)?;
        println!("Wrote {} export file(s) to {}", written.len(), dir.display());
    }

    Ok(())
}

fn handle_specimens(args: SpecimensArgs) -> Result<(), AppError> {
    let registry = pipeline::load_registry(args.specimens.as_deref())?;
    println!("{}", crate::report::format_specimen_table(&registry));
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let registry = pipeline::load_registry(args.specimens.as_deref())?;
    let config = SynthConfig {
        seed: args.seed,
        noise_g: args.noise,
        tail_s: args.tail,
        spike_prob: args.spike_prob,
        ..SynthConfig::default()
    };

    let written = write_synthetic_logs(&registry, &args.out, &config)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

pub fn analysis_config_from_args(args: &AnalysisArgs) -> AnalysisConfig {
    let data_dir = args
        .dir
        .clone()
        .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    AnalysisConfig {
        data_dir,
        specimens_path: args.specimens.clone(),
        engine: EngineConfig {
            plateau_window_len: args.plateau_window,
            max_duration_s: args.max_duration,
            plateau_source: args.plateau_source,
        },
        plot_window_s: args.plot_window,
        fit_ranges: args.fits.clone(),
    }
}

fn log_config_from_args(args: &LogArgs) -> LogConfig {
    LogConfig {
        level: args.log_level,
        format: args.log_format,
        sink: match &args.log_file {
            Some(path) => LogSink::File(path.clone()),
            None => LogSink::Stderr,
        },
    }
}

/// Rewrite argv so `pellets` defaults to `pellets tui`.
///
/// Rules:
/// - `pellets`                         -> `pellets tui`
/// - `pellets --fit ... -d runs`       -> `pellets tui --fit ... -d runs`
/// - `pellets -d synth`                -> `pellets tui -d synth`
/// - `pellets --help/--version/-h`     -> unchanged (show top-level help/version)
/// - `pellets --log-level debug synth` -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    // Skip global log flags so the first remaining token decides.
    let mut idx = 1;
    while let Some(arg) = argv.get(idx) {
        if GLOBAL_VALUE_FLAGS.contains(&arg.as_str()) {
            idx += 2;
        } else if GLOBAL_VALUE_FLAGS.iter().any(|f| arg.starts_with(&format!("{f}="))) {
            idx += 1;
        } else {
            break;
        }
    }

    let Some(first) = argv.get(idx).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        first.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if SUBCOMMANDS.contains(&first.as_str()) {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if first.starts_with('-') {
        argv.insert(idx, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
