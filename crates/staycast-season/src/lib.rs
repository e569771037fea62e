#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/staycast/staycast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregator;
pub mod classify;
pub mod error;
pub mod index;
pub mod normalize;
pub mod series;

pub use aggregator::{CalendarAggregator, SeasonConfig, SeasonReport};
pub use classify::{Season, SeasonThresholds, quantile};
pub use error::SeasonError;
pub use index::{SEASON_INDEX_VERSION, SeasonIndex};
pub use normalize::{availability_flag, normalize};
pub use series::{DailySeries, aggregate, rolling_mean};
