//! Error types for artifact storage.
//!
//! Covers every failure mode of reading and writing the pipeline's files:
//! I/O, CSV, JSON and YAML serialization, missing required inputs, and
//! manifest validation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing artifacts.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or serialization failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A required input artifact does not exist.
    #[error("required input {artifact} not found at {}", path.display())]
    MissingInput {
        artifact: &'static str,
        path: PathBuf,
    },

    /// Manifest validation failure (e.g., missing required fields).
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
