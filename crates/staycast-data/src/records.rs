//! Raw and cleaned record types.
//!
//! Raw rows mirror the CSV columns the pipeline reads. Cleaned records carry
//! typed values: dates are `NaiveDate`, prices are decimals, and numeric
//! listing attributes are [`Measure`]s so that a missing cell and an
//! unparsable cell stay distinguishable until imputation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of `calendar.csv` as read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCalendarRow {
    /// Listing identifier
    pub listing_id: u64,
    /// Calendar date, expected as `yyyy-mm-dd`
    pub date: String,
    /// Availability flag (`t` / `f`)
    pub available: String,
    /// Nightly price with currency formatting
    #[serde(default)]
    pub price: Option<String>,
    /// Adjusted nightly price with currency formatting
    #[serde(default)]
    pub adjusted_price: Option<String>,
}

/// One row of `listings.csv` as read from disk.
///
/// Only the columns the feature schema needs are decoded; the remaining
/// listing columns are ignored by the CSV reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListingRow {
    /// Listing identifier
    pub id: u64,
    /// Room type, e.g. `Entire home/apt`
    #[serde(default)]
    pub room_type: Option<String>,
    /// Number of guests the listing accommodates
    #[serde(default)]
    pub accommodates: Option<String>,
    /// Bedroom count
    #[serde(default)]
    pub bedrooms: Option<String>,
    /// Bathroom count
    #[serde(default)]
    pub bathrooms: Option<String>,
    /// Bed count
    #[serde(default)]
    pub beds: Option<String>,
    /// Cleansed neighbourhood name
    #[serde(rename = "neighbourhood_cleansed", default)]
    pub neighbourhood: Option<String>,
}

/// A numeric cell that may be absent or fail to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Measure {
    /// The cell was empty.
    Missing,
    /// The cell held a number.
    Value(f64),
    /// The cell held text that is not a number.
    Unparsable(String),
}

impl Measure {
    /// Classify an optional raw cell.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Missing,
            Some(text) => text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map_or_else(|| Self::Unparsable(text.to_string()), Self::Value),
        }
    }

    /// The numeric value, if the cell held one.
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Missing | Self::Unparsable(_) => None,
        }
    }

    /// Whether the cell was empty.
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl From<Option<f64>> for Measure {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Value)
    }
}

/// A cleaned calendar record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRecord {
    /// Listing identifier
    pub listing_id: u64,
    /// Calendar date
    pub date: NaiveDate,
    /// 1 when the night was open for booking, 0 when it was not, `None`
    /// when the flag was unrecognised
    pub available: Option<u8>,
    /// Nightly price
    pub price: Option<f64>,
    /// Adjusted nightly price, backfilled from `price` when absent
    pub adjusted_price: Option<f64>,
}

/// Listing attributes joined onto calendar records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingAttributes {
    /// Listing identifier
    pub id: u64,
    /// Room type
    pub room_type: String,
    /// Guest capacity
    pub accommodates: Measure,
    /// Bedroom count
    pub bedrooms: Measure,
    /// Bathroom count
    pub bathrooms: Measure,
    /// Bed count
    pub beds: Measure,
    /// Neighbourhood
    pub neighbourhood: String,
}

impl From<RawListingRow> for ListingAttributes {
    fn from(row: RawListingRow) -> Self {
        Self {
            id: row.id,
            room_type: row.room_type.unwrap_or_default(),
            accommodates: Measure::parse(row.accommodates.as_deref()),
            bedrooms: Measure::parse(row.bedrooms.as_deref()),
            bathrooms: Measure::parse(row.bathrooms.as_deref()),
            beds: Measure::parse(row.beds.as_deref()),
            neighbourhood: row.neighbourhood.unwrap_or_default(),
        }
    }
}
