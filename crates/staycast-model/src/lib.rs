#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/staycast/staycast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod linear;
pub mod lineage;
pub mod metrics;
pub mod model;
pub mod scaler;
pub mod sgd;
pub mod transform;

pub use error::{ModelError, Result};
pub use lineage::Lineage;
pub use linear::{LinearModel, MODEL_VERSION};
pub use metrics::{r2, rmse};
pub use model::{FitReport, PriceModel};
pub use scaler::StandardScaler;
pub use sgd::{SgdConfig, SgdFit, SgdRegressor};
pub use transform::TargetTransform;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
