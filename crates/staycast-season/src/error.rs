//! Error types for season derivation.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while building or loading a season index.
#[derive(Debug, Error)]
pub enum SeasonError {
    /// Insufficient data for classification
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Season code outside {0, 1, 2}
    #[error("Invalid season code: {0}")]
    InvalidCode(u8),

    /// Canonical year days without a season
    #[error("Season index for {year} is missing {missing} days, first {first}")]
    IncompleteCoverage {
        /// Canonical year
        year: i32,
        /// Number of uncovered days
        missing: usize,
        /// Earliest uncovered day
        first: NaiveDate,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Raw data error
    #[error(transparent)]
    Data(#[from] staycast_data::DataError),
}
