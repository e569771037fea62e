#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/staycast/staycast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod pipeline;

// Re-export main types from sub-crates
pub use staycast_data as data;
pub use staycast_features as features;
pub use staycast_model as model;
pub use staycast_season as season;
pub use staycast_serve as serve;

pub use error::{PipelineError, Result};
pub use pipeline::{BuildOutput, OfflinePipeline, PipelineConfig, PipelineRun};
pub use staycast_serve::{ArtifactLayout, ArtifactSlot, Gateway, GatewayConfig};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
