//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while reading raw records or persisting artifacts.
#[derive(Debug, Error)]
pub enum DataError {
    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Missing data
    #[error("Missing data in {source_name}: {reason}")]
    MissingData {
        /// File or table that was read
        source_name: String,
        /// Reason for missing data
        reason: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Artifact version the reader does not understand
    #[error("Unsupported {artifact} artifact version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Artifact kind
        artifact: &'static str,
        /// Version found on disk
        found: u32,
        /// Version this build writes
        expected: u32,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
