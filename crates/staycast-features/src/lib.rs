#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/staycast/staycast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod date;
pub mod error;
pub mod impute;
pub mod labels;
pub mod matrix;
pub mod schema;

pub use builder::{BuildStats, FeatureBuild, FeatureBuilder, FeatureConfig};
pub use date::{EPOCH, date_numeric};
pub use error::FeatureError;
pub use impute::{ImputedRooms, Rooms, impute, impute_request};
pub use labels::{LABEL_STORE_VERSION, LabelEncoder, LabelStore};
pub use matrix::{TrainingMatrix, TrainingRow, TrainingSet, read_training_set};
pub use schema::{
    CATEGORICAL_COLUMNS, Column, ColumnInfo, ColumnKind, FEATURE_COLUMNS, FEATURE_COUNT,
    FeatureVector, MATRIX_COLUMNS, available_columns, feature_names, get_column_info,
    matrix_column_names,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
