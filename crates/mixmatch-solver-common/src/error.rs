//! Error types and exit codes for optimizer runs.

use std::path::PathBuf;
use thiserror::Error;

/// How the optimizer process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Exit status 0
    Success,
    /// Non-zero exit status
    Error(i32),
    /// Killed by a signal (no exit status)
    Terminated,
}

impl ExitCode {
    /// Convert from a raw status code (`None` when killed by a signal).
    pub fn from_raw(code: Option<i32>) -> Self {
        match code {
            Some(0) => ExitCode::Success,
            Some(code) => ExitCode::Error(code),
            None => ExitCode::Terminated,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Success => write!(f, "0"),
            ExitCode::Error(code) => write!(f, "{code}"),
            ExitCode::Terminated => write!(f, "terminated by signal"),
        }
    }
}

/// Errors that can occur while exchanging data with the optimizer.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Optimizer process failed to start.
    #[error("Failed to start optimizer '{program}': {source}")]
    ProcessStart {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Optimizer process exited non-zero or was killed.
    #[error("Optimizer process failed ({exit_code}): {message}")]
    ProcessFailed { exit_code: ExitCode, message: String },

    /// Configured model file does not exist.
    #[error("Model file not found: {}", .0.display())]
    MissingModelFile(PathBuf),

    /// Optimizer binary is not installed.
    #[error("Optimizer '{program}' not found. {hint}")]
    NotInstalled { program: String, hint: String },

    /// An output file exists but does not have the expected shape.
    #[error("Malformed optimizer output {}: {message}", .file.display())]
    MalformedOutput { file: PathBuf, message: String },

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization/deserialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Manifest serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for optimizer operations.
pub type SolverResult<T> = Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_from_raw() {
        assert_eq!(ExitCode::from_raw(Some(0)), ExitCode::Success);
        assert_eq!(ExitCode::from_raw(Some(3)), ExitCode::Error(3));
        assert_eq!(ExitCode::from_raw(None), ExitCode::Terminated);
        assert!(ExitCode::Success.is_success());
        assert!(!ExitCode::Error(1).is_success());
    }

    #[test]
    fn not_installed_carries_hint() {
        let err = SolverError::NotInstalled {
            program: "gams".into(),
            hint: "Set [solver] program in ~/.mixmatch/config.toml".into(),
        };
        let text = err.to_string();
        assert!(text.contains("gams"));
        assert!(text.contains("config.toml"));
    }
}
