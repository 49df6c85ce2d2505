//! Error types for the record store.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing a store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record carries no usable data. Raised before any I/O.
    #[error("No data provided to save: {0}")]
    Validation(String),

    /// The backing file could not be read or written
    #[error("Failed to access {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a readable or writable workbook
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// The CSV source could not be parsed
    #[error("CSV error: {0}")]
    Csv(String),

    /// A table schema is internally inconsistent
    #[error("Invalid schema: {0}")]
    Schema(String),

    /// The header row on disk does not match the schema's column order
    #[error("Header mismatch in table '{table}': expected {expected:?}, found {found:?}")]
    HeaderMismatch {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl StoreError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// True for failures the caller can fix by resubmitting with data
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

impl From<calamine::Error> for StoreError {
    fn from(err: calamine::Error) -> Self {
        StoreError::Workbook(err.to_string())
    }
}

impl From<calamine::XlsxError> for StoreError {
    fn from(err: calamine::XlsxError) -> Self {
        StoreError::Workbook(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for StoreError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        StoreError::Workbook(err.to_string())
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        StoreError::Csv(err.to_string())
    }
}
