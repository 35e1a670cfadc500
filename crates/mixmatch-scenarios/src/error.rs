//! Errors raised while parsing scenario datasets.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while indexing, reading or aggregating a dataset.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A required configuration CSV is missing from the dataset directory.
    #[error("Configuration file not found: {}", .0.display())]
    MissingConfigFile(PathBuf),

    /// A configuration CSV exists but could not be parsed.
    #[error("Failed to read configuration {}: {source}", .path.display())]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Scenario data filename does not follow `<scenario>.<attribute>.<temporal>.<spatial>.<ext>`.
    #[error("Malformed scenario filename '{name}': expected 4 dot-separated components, found {found}")]
    MalformedFilename { name: String, found: usize },

    /// Data file missing, not valid CSV, or holding non-numeric values.
    #[error("Cannot read data file {}: {message}", .path.display())]
    DataFileUnreadable { path: PathBuf, message: String },

    /// More than one column besides `gid`, `value` and `time`.
    #[error("Ambiguous schema in {}: extra columns {columns:?}, at most one allowed", .path.display())]
    AmbiguousSchema { path: PathBuf, columns: Vec<String> },

    /// A column required by the file's shape is absent.
    #[error("Missing column '{column}' in {}", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// `get_data` was called before `read`.
    #[error("Data file {} has not been read", .0.display())]
    NotRead(PathBuf),

    /// No genmix file (or no value) for the requested combination.
    #[error("No generation mix available for year '{year}', scenario '{scenario}', geographies {geographies:?}")]
    NoGenerationMixAvailable {
        year: String,
        scenario: String,
        geographies: Vec<String>,
    },

    /// Requested geography is not present in the sub-national data.
    #[error("Unknown geography '{geography}' in {}", .path.display())]
    UnknownGeography { path: PathBuf, geography: String },

    /// Value tree does not have the shape the aggregation needs.
    #[error("Unexpected data shape in {}: expected {expected}", .path.display())]
    UnexpectedShape { path: PathBuf, expected: String },

    /// Genmix table assembly failed.
    #[error(transparent)]
    Table(#[from] mixmatch_core::CoreError),

    /// I/O errors (directory listing)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using ScenarioError.
pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genmix_error_lists_request() {
        let err = ScenarioError::NoGenerationMixAvailable {
            year: "2030".into(),
            scenario: "Mid".into(),
            geographies: vec!["CO".into(), "UT".into()],
        };
        let text = err.to_string();
        assert!(text.contains("2030"));
        assert!(text.contains("Mid"));
        assert!(text.contains("UT"));
    }

    #[test]
    fn malformed_filename_reports_count() {
        let err = ScenarioError::MalformedFilename {
            name: "Mid.capacity.csv".into(),
            found: 2,
        };
        assert!(err.to_string().contains("found 2"));
    }
}
