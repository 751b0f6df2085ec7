//! Balance log discovery and ingest.
//!
//! This module turns a directory of tab-separated balance logs into
//! `RawSeries` values. It knows nothing about specimens or kinetics.
//!
//! Design goals:
//! - **Positional schema**: the first two columns are time (s) and weight (g),
//!   whatever their header says; extra columns are ignored
//! - **Strict rows**: a short or unparseable row is a data format error for
//!   that file, reported with its line number
//! - **Deterministic order**: sources are returned sorted by file name

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::debug;

use crate::domain::RawSeries;
use crate::error::{KineticsError, KineticsResult};

/// Extension of balance log files.
pub const SOURCE_EXTENSION: &str = "txt";

/// List balance logs (`*.txt`) directly inside `dir`, sorted by file name.
///
/// Other files (including `.csv` exports) are ignored.
pub fn discover_sources(dir: &Path) -> KineticsResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| KineticsError::io(dir, e))?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| KineticsError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_log = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(SOURCE_EXTENSION));
        if is_log {
            sources.push(path);
        }
    }

    sources.sort();
    debug!(dir = %dir.display(), count = sources.len(), "discovered balance logs");
    Ok(sources)
}

/// Source name of a file: its stem, which carries the specimen id.
pub fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read one balance log into a `RawSeries`.
pub fn read_raw_series(path: &Path) -> KineticsResult<RawSeries> {
    let file = File::open(path).map_err(|e| KineticsError::io(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut time = Vec::new();
    let mut weight = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Fallback when the reader has no position: one header line, 1-based.
        let fallback_line = idx + 2;
        let record = result.map_err(|e| format_error(path, fallback_line, format!("parse error: {e}")))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        if is_blank(&record) {
            continue;
        }
        if record.len() < 2 {
            return Err(format_error(
                path,
                line,
                format!("expected at least 2 columns (time, weight), found {}", record.len()),
            ));
        }

        let t = parse_number(&record[0]).map_err(|reason| format_error(path, line, format!("time: {reason}")))?;
        let w = parse_number(&record[1]).map_err(|reason| format_error(path, line, format!("weight: {reason}")))?;
        time.push(t);
        weight.push(w);
    }

    if time.is_empty() {
        return Err(format_error(path, 1, "no data rows after the header".to_string()));
    }

    RawSeries::new(time, weight)
}

fn format_error(path: &Path, line: usize, reason: String) -> KineticsError {
    KineticsError::DataFormat {
        path: path.to_path_buf(),
        line,
        reason,
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.is_empty())
}

/// Parse a finite number, accepting a decimal comma (`1,25`).
fn parse_number(s: &str) -> Result<f64, String> {
    if s.is_empty() {
        return Err("empty value".to_string());
    }
    let v = match s.parse::<f64>() {
        Ok(v) => v,
        Err(_) => s
            .replacen(',', ".", 1)
            .parse::<f64>()
            .map_err(|_| format!("'{s}' is not a number"))?,
    };
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("'{s}' is not finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_first_two_columns_and_skips_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "pellet_test_01.txt",
            "Time(s)\tWeight\tTemp\n0\t0.000\t25.1\n1\t0.012\t25.3\n2\t0.031\t25.2\n",
        );
        let raw = read_raw_series(&path).unwrap();
        assert_eq!(raw.time, vec![0.0, 1.0, 2.0]);
        assert_eq!(raw.weight, vec![0.0, 0.012, 0.031]);
    }

    #[test]
    fn accepts_decimal_commas_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", "t\tw\n0\t1,5\n\n1\t1,25\n");
        let raw = read_raw_series(&path).unwrap();
        assert_eq!(raw.weight, vec![1.5, 1.25]);
    }

    #[test]
    fn short_rows_are_data_format_errors_with_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", "t\tw\n0\t1.0\n1\n");
        let err = read_raw_series(&path).unwrap_err();
        match err {
            KineticsError::DataFormat { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", "t\tw\n0\tabc\n");
        let err = read_raw_series(&path).unwrap_err();
        assert!(matches!(err, KineticsError::DataFormat { line: 2, .. }));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn header_only_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", "t\tw\n");
        assert!(matches!(read_raw_series(&path), Err(KineticsError::DataFormat { .. })));
    }

    #[test]
    fn discovery_lists_txt_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "pellet_test_10.txt", "t\tw\n0\t1\n");
        write_file(dir.path(), "pellet_test_01.TXT", "t\tw\n0\t1\n");
        write_file(dir.path(), "export.csv", "a,b\n");
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let sources = discover_sources(dir.path()).unwrap();
        let names: Vec<String> = sources.iter().map(|p| source_name(p)).collect();
        assert_eq!(names, vec!["pellet_test_01", "pellet_test_10"]);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let err = discover_sources(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, KineticsError::Io { .. }));
    }
}
