//! CSV loading for listings and calendar files.

use crate::error::{DataError, Result};
use crate::records::{ListingAttributes, RawCalendarRow, RawListingRow};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;
use tracing::info;

fn read_rows<T, R>(reader: R, source_name: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let rows = csv_reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;

    if rows.is_empty() {
        return Err(DataError::MissingData {
            source_name: source_name.to_string(),
            reason: "no rows".to_string(),
        });
    }

    Ok(rows)
}

/// Read raw calendar rows from any reader.
pub fn read_calendar<R: Read>(reader: R) -> Result<Vec<RawCalendarRow>> {
    read_rows(reader, "calendar")
}

/// Read listing attributes from any reader.
pub fn read_listings<R: Read>(reader: R) -> Result<Vec<ListingAttributes>> {
    let rows: Vec<RawListingRow> = read_rows(reader, "listings")?;
    Ok(rows.into_iter().map(ListingAttributes::from).collect())
}

/// Load `calendar.csv`.
pub fn load_calendar<P: AsRef<Path>>(path: P) -> Result<Vec<RawCalendarRow>> {
    let path = path.as_ref();
    let rows = read_calendar(std::fs::File::open(path)?)?;
    info!(path = %path.display(), rows = rows.len(), "loaded calendar");
    Ok(rows)
}

/// Load `listings.csv`.
pub fn load_listings<P: AsRef<Path>>(path: P) -> Result<Vec<ListingAttributes>> {
    let path = path.as_ref();
    let listings = read_listings(std::fs::File::open(path)?)?;
    info!(path = %path.display(), rows = listings.len(), "loaded listings");
    Ok(listings)
}
