//! Error types for the gateway.

use chrono::NaiveDate;
use staycast_features::FeatureError;
use staycast_model::ModelError;
use staycast_season::SeasonError;
use thiserror::Error;

/// Request-scoped gateway failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Malformed or missing request field
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// Categorical value absent from the frozen vocabulary
    #[error("Unknown {column}: {value:?}")]
    UnknownCategory {
        /// Column name
        column: String,
        /// Rejected value
        value: String,
    },

    /// Normalized date absent from the season index
    #[error("No season data for {0}")]
    MissingSeasonData(NaiveDate),

    /// Artifacts failed to load
    #[error("Model unavailable")]
    ModelUnavailable,

    /// A numeric field could not be coerced
    #[error("Numeric coercion failed: {0}")]
    NumericCoercion(String),

    /// The model failed to produce a prediction
    #[error("Prediction failed: {0}")]
    Model(String),
}

impl GatewayError {
    /// Stable machine-readable name.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InputValidation(_) => "input_validation",
            Self::UnknownCategory { .. } => "unknown_category",
            Self::MissingSeasonData(_) => "missing_season_data",
            Self::ModelUnavailable => "model_unavailable",
            Self::NumericCoercion(_) => "numeric_coercion",
            Self::Model(_) => "model_error",
        }
    }

    /// HTTP status the error maps to.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InputValidation(_) => 400,
            Self::UnknownCategory { .. } | Self::MissingSeasonData(_) => 422,
            Self::ModelUnavailable => 503,
            Self::NumericCoercion(_) | Self::Model(_) => 500,
        }
    }
}

impl From<FeatureError> for GatewayError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::UnknownCategory { column, value } => {
                Self::UnknownCategory { column, value }
            }
            FeatureError::MissingSeason(date) => Self::MissingSeasonData(date),
            FeatureError::NumericCoercion { column, reason } => {
                Self::NumericCoercion(format!("{column}: {reason}"))
            }
            other => Self::Model(other.to_string()),
        }
    }
}

impl From<ModelError> for GatewayError {
    fn from(err: ModelError) -> Self {
        Self::Model(err.to_string())
    }
}

/// Errors raised while loading serving artifacts.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Season index could not be loaded
    #[error("Season index: {0}")]
    Season(#[from] SeasonError),

    /// Label store could not be loaded
    #[error("Label store: {0}")]
    Labels(#[from] FeatureError),

    /// Model could not be loaded
    #[error("Model: {0}")]
    Model(#[from] ModelError),

    /// Artifacts disagree with each other or with the configuration
    #[error("Inconsistent artifacts: {0}")]
    Inconsistent(String),
}
