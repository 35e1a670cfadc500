//! Error type shared by the inventory and table helpers.

use thiserror::Error;

/// Errors raised while loading inventories or manipulating type tables.
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading/writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input table does not have the expected shape
    #[error("Schema error in {context}: {message}")]
    Schema { context: String, message: String },

    /// A value could not be parsed as a number
    #[error("Invalid number '{value}' in column '{column}' ({context})")]
    InvalidNumber {
        context: String,
        column: String,
        value: String,
    },

    /// Column lookup on a type table failed
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// Row lookup on a type table failed
    #[error("Unknown row '{0}'")]
    UnknownRow(String),

    /// Merge would produce two columns with the same name
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    /// Dataframe operation errors
    #[error("Table error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

/// Convenience type alias for Results using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub(crate) fn schema(context: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Schema {
            context: context.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_display_names_context() {
        let err = CoreError::schema("nodes.csv", "expected at least 5 columns");
        let text = err.to_string();
        assert!(text.contains("nodes.csv"));
        assert!(text.contains("at least 5 columns"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
