//! Error type for the offline pipeline.

use staycast_data::DataError;
use staycast_features::FeatureError;
use staycast_model::ModelError;
use staycast_season::SeasonError;
use staycast_serve::LoadError;
use thiserror::Error;

/// Errors that abort a pipeline run.
///
/// A run that fails leaves the artifact directory untouched.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading inputs or writing artifacts failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Season derivation failed
    #[error(transparent)]
    Season(#[from] SeasonError),

    /// Matrix construction failed
    #[error(transparent)]
    Features(#[from] FeatureError),

    /// Training failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Artifacts could not be loaded back
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Stages disagree on shared settings
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
