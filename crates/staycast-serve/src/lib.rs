#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/staycast/staycast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifacts;
pub mod error;
pub mod gateway;
pub mod request;

pub use artifacts::{ArtifactLayout, ArtifactSlot, GatewayConfig, ServingArtifacts, lineage};
pub use error::{GatewayError, LoadError};
pub use gateway::{Gateway, Prediction, normalize_year, round_cents};
pub use request::{
    ErrorDetail, ErrorResponse, PredictionRequest, PredictionResponse, RawPredictionRequest,
    parse_date,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
