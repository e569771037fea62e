#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/staycast/staycast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifact;
pub mod error;
pub mod loader;
pub mod price;
pub mod records;

pub use error::{DataError, Result};
pub use loader::{load_calendar, load_listings, read_calendar, read_listings};
pub use price::{parse_optional_price, parse_price};
pub use records::{CalendarRecord, ListingAttributes, Measure, RawCalendarRow, RawListingRow};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
