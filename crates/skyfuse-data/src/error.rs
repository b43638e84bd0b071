//! Error types for the catalog pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while reading, matching or assembling catalogs
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown catalog: {0}")]
    UnknownCatalog(String),

    #[error("No match radius configured for catalog '{0}'")]
    MissingRadius(String),

    #[error("Band '{0}' is not defined")]
    MissingBand(String),

    #[error("Table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Column '{column}' has type {found}, expected {expected}")]
    ColumnType { column: String, expected: &'static str, found: &'static str },

    #[error("Column '{column}' has {found} rows, table has {expected}")]
    ColumnLength { column: String, expected: usize, found: usize },

    #[error("Tables cannot be concatenated: {0}")]
    Schema(String),

    #[error("No data files for catalog in {0}")]
    NoInputFiles(PathBuf),

    #[error("{program} exited with {status}")]
    Subprocess { program: String, status: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        PipelineError::MissingColumn { table: table.into(), column: column.into() }
    }

    /// Configuration problems are the errors raised before any table I/O
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipelineError::Configuration(_)
                | PipelineError::UnknownCatalog(_)
                | PipelineError::MissingRadius(_)
                | PipelineError::MissingBand(_)
        )
    }
}
