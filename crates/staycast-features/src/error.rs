//! Error types for feature engineering.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while building or encoding features.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Categorical value absent from the frozen vocabulary
    #[error("Unknown category {value:?} for column {column}")]
    UnknownCategory {
        /// Column name
        column: String,
        /// Value that was never seen at fit time
        value: String,
    },

    /// Column has no fitted vocabulary
    #[error("No vocabulary for column {0}")]
    UnknownColumn(String),

    /// A column was fit more than once
    #[error("Vocabulary for column {0} fit twice")]
    DuplicateColumn(String),

    /// Persisted vocabulary is not a bijection onto `0..K`
    #[error("Invalid vocabulary for column {column}: {reason}")]
    InvalidVocabulary {
        /// Column name
        column: String,
        /// What went wrong
        reason: String,
    },

    /// Numeric field still missing after imputation
    #[error("Numeric coercion failed for {column}: {reason}")]
    NumericCoercion {
        /// Column name
        column: String,
        /// What went wrong
        reason: String,
    },

    /// Date with no season entry
    #[error("No season for date {0}")]
    MissingSeason(NaiveDate),

    /// Empty data provided where non-empty was required
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Raw data or artifact error
    #[error(transparent)]
    Data(#[from] staycast_data::DataError),
}
