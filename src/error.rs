//! Error types for Cohort Flux

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse content payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Window index {index} out of range ({len} windows)")]
    WindowOutOfRange { index: usize, len: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Content source error: {0}")]
    SourceError(String),
}
