//! Error types.
//!
//! Two layers:
//!
//! - [`KineticsError`]: typed failures of the analysis core (registry, ingest,
//!   engine, fitting). Per-specimen failures are carried as values of this type
//!   so one bad file never aborts the others.
//! - [`AppError`]: what the binary reports. It only knows a message and an exit
//!   code.
//!
//! Exit codes: `2` input/configuration, `3` no usable data, `4` numerical or
//! runtime failure.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for the analysis core.
pub type KineticsResult<T> = Result<T, KineticsError>;

/// Coarse classification used by reports and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    DataFormat,
    InsufficientData,
    InvalidPlateau,
    Fit,
    Io,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::DataFormat => "data format",
            ErrorKind::InsufficientData => "insufficient data",
            ErrorKind::InvalidPlateau => "invalid plateau",
            ErrorKind::Fit => "fit",
            ErrorKind::Io => "io",
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Configuration | ErrorKind::DataFormat | ErrorKind::Io => 2,
            ErrorKind::InsufficientData => 3,
            ErrorKind::InvalidPlateau | ErrorKind::Fit => 4,
        }
    }
}

/// Failures of the analysis core.
#[derive(Error, Debug)]
pub enum KineticsError {
    /// The specimen id has no registry entry.
    #[error("Unknown specimen id {id}: no entry in the specimen table")]
    UnknownSpecimen { id: u32 },

    /// The specimen id could not be read from a source name.
    #[error("Cannot read specimen id from source name '{name}': {reason}")]
    InvalidSourceName { name: String, reason: String },

    /// Invalid settings or specimen table contents.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source file does not have the expected shape.
    #[error("Data format error in '{}' (line {line}): {reason}", path.display())]
    DataFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Nothing remains after alignment.
    #[error("Insufficient data: {available} raw samples, onset at sample {start_time_s}, max duration {max_duration_s}")]
    InsufficientData {
        available: usize,
        start_time_s: usize,
        max_duration_s: usize,
    },

    /// The plateau estimate cannot be used as a normalizer.
    #[error("Invalid plateau estimate {value} (must be finite and > 0)")]
    InvalidPlateau { value: f64 },

    /// A least-squares fit needs at least two points.
    #[error("Linear fit needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// Paired samples of different lengths.
    #[error("Length mismatch: {x} x-values vs {y} y-values")]
    LengthMismatch { x: usize, y: usize },

    /// All x-values are equal, the slope is undefined.
    #[error("Linear fit is degenerate: x has zero variance")]
    DegenerateFit,

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl KineticsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KineticsError::UnknownSpecimen { .. }
            | KineticsError::InvalidSourceName { .. }
            | KineticsError::Config(_) => ErrorKind::Configuration,
            KineticsError::DataFormat { .. } => ErrorKind::DataFormat,
            KineticsError::InsufficientData { .. } => ErrorKind::InsufficientData,
            KineticsError::InvalidPlateau { .. } => ErrorKind::InvalidPlateau,
            KineticsError::TooFewPoints(_)
            | KineticsError::LengthMismatch { .. }
            | KineticsError::DegenerateFit => ErrorKind::Fit,
            KineticsError::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KineticsError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<KineticsError> for AppError {
    fn from(err: KineticsError) -> Self {
        AppError::new(err.kind().exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_specimen_message_names_the_id() {
        let err = KineticsError::UnknownSpecimen { id: 3 };
        assert!(err.to_string().contains('3'));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn app_error_keeps_exit_code_of_kind() {
        let app: AppError = KineticsError::InsufficientData {
            available: 10,
            start_time_s: 20,
            max_duration_s: 6000,
        }
        .into();
        assert_eq!(app.exit_code(), 3);

        let app: AppError = KineticsError::InvalidPlateau { value: 0.0 }.into();
        assert_eq!(app.exit_code(), 4);
    }
}
