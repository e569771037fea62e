//! Error types for model fitting and prediction.

use thiserror::Error;

/// Errors that can occur while fitting, persisting or evaluating a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Predict called before fit
    #[error("Model has not been fitted")]
    NotFitted,

    /// Shapes of inputs do not agree
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Empty data provided where non-empty was required
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Invalid configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Persisted model was trained on different features
    #[error("Feature mismatch: expected {expected:?}, found {found:?}")]
    FeatureMismatch {
        /// Names the caller assembles vectors in
        expected: Vec<String>,
        /// Names stored in the artifact
        found: Vec<String>,
    },

    /// A value outside the target transform's domain, or a non-finite output
    #[error("Non-finite value: {0}")]
    NonFinite(String),

    /// Artifact IO or format error
    #[error(transparent)]
    Data(#[from] staycast_data::DataError),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
