//! Structured logging setup.
//!
//! Events are emitted with `tracing` throughout the crate; this module installs
//! the global subscriber once at startup.
//!
//! - `RUST_LOG` overrides the configured level when set
//! - output goes to stderr, to a log file, or nowhere (used by the TUI so the
//!   alternate screen is not overwritten)

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{KineticsError, KineticsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-readable.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
}

/// Where formatted events are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogSink {
    #[default]
    Stderr,
    File(PathBuf),
    Discard,
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub sink: LogSink,
}

impl LogConfig {
    /// Sink for full-screen front-ends: the log file if one is given, else
    /// nothing.
    pub fn for_terminal_ui(mut self) -> Self {
        self.sink = match self.sink {
            LogSink::File(path) => LogSink::File(path),
            LogSink::Stderr | LogSink::Discard => LogSink::Discard,
        };
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))
    }

    fn writer(&self) -> KineticsResult<(BoxMakeWriter, bool)> {
        match &self.sink {
            LogSink::Stderr => Ok((BoxMakeWriter::new(std::io::stderr), true)),
            LogSink::Discard => Ok((BoxMakeWriter::new(std::io::sink), false)),
            LogSink::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| KineticsError::io(path, e))?;
                Ok((BoxMakeWriter::new(Mutex::new(file)), false))
            }
        }
    }
}

/// Install the global subscriber.
///
/// Only the log file can fail to open. A second call is a no-op.
pub fn init_logging(config: &LogConfig) -> KineticsResult<()> {
    let filter = config.filter();
    let (writer, ansi) = config.writer()?;

    let result = match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_ansi(ansi).with_writer(writer))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_ansi(ansi).with_writer(writer))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
    };

    // Already initialized (tests, repeated calls).
    let _ = result;
    Ok(())
}
