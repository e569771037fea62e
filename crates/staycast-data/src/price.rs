//! Currency-formatted price parsing.

use crate::error::{DataError, Result};

/// Parse a price such as `"$1,250.00"` into a decimal number.
///
/// Dollar signs and thousands separators are stripped before parsing.
/// Empty cells are missing values, not errors.
pub fn parse_price(raw: &str) -> Result<Option<f64>> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();

    if cleaned.is_empty() {
        return Ok(None);
    }

    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| DataError::Parse(format!("Invalid price: {raw:?}")))
}

/// Parse an optional price cell.
pub fn parse_optional_price(raw: Option<&str>) -> Result<Option<f64>> {
    raw.map_or(Ok(None), parse_price)
}
