//! Error types shared by the probes.
//!
//! Only a missing or unreadable top-level input is fatal. Everything that goes
//! wrong on a single record is logged and skipped by the caller, so it never
//! becomes one of these values.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("input not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what} in {}: {message}", .path.display())]
    Malformed {
        what: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Failure modes of a version-control history query.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The file or line range has no recorded history. Counts as zero changes.
    #[error("no history for {0}")]
    NoHistory(String),

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("history query exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// Fail fast when a top-level input file is absent.
pub fn require_file(path: &Path) -> Result<(), ProbeError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ProbeError::InputMissing(path.to_path_buf()))
    }
}

/// Fail fast when a top-level input directory is absent.
pub fn require_dir(path: &Path) -> Result<(), ProbeError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ProbeError::InputMissing(path.to_path_buf()))
    }
}

/// Read a whole top-level input into memory.
pub fn read_input(path: &Path) -> Result<String, ProbeError> {
    require_file(path)?;
    std::fs::read_to_string(path).map_err(|source| ProbeError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_reported() {
        let err = read_input(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ProbeError::InputMissing(_)));
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }
}
