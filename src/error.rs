//! Error types for the anomaly screening pipeline

use thiserror::Error;

/// Result type alias for screening operations
pub type Result<T> = std::result::Result<T, AnomaliaError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum AnomaliaError {
    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    #[error("No numeric feature columns remain after cleaning")]
    EmptyFeatureSet,

    #[error("Insufficient rows: got {rows}, neighbor-based scoring requires at least {required}")]
    InsufficientRows { rows: usize, required: usize },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for AnomaliaError {
    fn from(err: polars::error::PolarsError) -> Self {
        AnomaliaError::DataError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AnomaliaError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AnomaliaError::ExportError(err.to_string())
    }
}
