//! Calendar record cleaning.

use crate::error::SeasonError;
use chrono::NaiveDate;
use staycast_data::{CalendarRecord, RawCalendarRow, parse_optional_price};
use tracing::warn;

/// Map an availability flag to 0/1.
pub fn availability_flag(raw: &str) -> Option<u8> {
    match raw.trim() {
        "t" => Some(1),
        "f" => Some(0),
        _ => None,
    }
}

/// Clean raw calendar rows.
///
/// - availability flags `t`/`f` become 1/0; any other flag is kept as `None`
/// - prices have currency formatting stripped and become decimals
/// - an adjusted price that is missing or unparsable falls back to the raw
///   price of the same record
///
/// Rows whose date is not `yyyy-mm-dd` cannot be placed on the calendar and
/// are dropped. An unparsable raw price is a fatal data error.
pub fn normalize(rows: &[RawCalendarRow]) -> Result<Vec<CalendarRecord>, SeasonError> {
    let mut records = Vec::with_capacity(rows.len());
    let mut bad_dates = 0usize;
    let mut unknown_flags = 0usize;
    let mut adjusted_fallbacks = 0usize;

    for row in rows {
        let Ok(date) = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d") else {
            bad_dates += 1;
            continue;
        };

        let available = availability_flag(&row.available);
        if available.is_none() {
            unknown_flags += 1;
        }

        let price = parse_optional_price(row.price.as_deref())?;
        let adjusted_price = match parse_optional_price(row.adjusted_price.as_deref()) {
            Ok(Some(adjusted)) => Some(adjusted),
            Ok(None) => price,
            Err(_) => {
                adjusted_fallbacks += 1;
                price
            }
        };

        records.push(CalendarRecord {
            listing_id: row.listing_id,
            date,
            available,
            price,
            adjusted_price,
        });
    }

    if bad_dates > 0 {
        warn!(rows = bad_dates, "dropped calendar rows with unparsable dates");
    }
    if unknown_flags > 0 {
        warn!(rows = unknown_flags, "calendar rows with unknown availability flag");
    }
    if adjusted_fallbacks > 0 {
        warn!(
            rows = adjusted_fallbacks,
            "unparsable adjusted prices replaced by raw price"
        );
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn raw(
        date: &str,
        available: &str,
        price: Option<&str>,
        adjusted: Option<&str>,
    ) -> RawCalendarRow {
        RawCalendarRow {
            listing_id: 1,
            date: date.to_string(),
            available: available.to_string(),
            price: price.map(str::to_string),
            adjusted_price: adjusted.map(str::to_string),
        }
    }

    #[rstest]
    #[case("t", Some(1))]
    #[case("f", Some(0))]
    #[case(" t ", Some(1))]
    #[case("yes", None)]
    fn test_availability_flag(#[case] flag: &str, #[case] expected: Option<u8>) {
        assert_eq!(availability_flag(flag), expected);
    }

    #[test]
    fn test_normalize_backfills_adjusted_price() {
        let rows = vec![
            raw("2025-01-01", "t", Some("$1,200.00"), None),
            raw("2025-01-02", "f", Some("$80.00"), Some("$75.00")),
            raw("2025-01-03", "f", Some("$80.00"), Some("ask host")),
        ];
        let records = normalize(&rows).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].available, Some(1));
        assert_eq!(records[0].price, Some(1200.0));
        assert_eq!(records[0].adjusted_price, Some(1200.0));
        assert_eq!(records[1].adjusted_price, Some(75.0));
        assert_eq!(records[2].adjusted_price, Some(80.0));
    }

    #[test]
    fn test_normalize_drops_bad_dates() {
        let rows = vec![
            raw("15-06-2025", "t", None, None),
            raw("2025-06-15", "t", None, None),
        ];
        let records = normalize(&rows).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
    }

    #[test]
    fn test_normalize_rejects_unparsable_price() {
        let rows = vec![raw("2025-06-15", "t", Some("free"), None)];
        assert!(matches!(normalize(&rows), Err(SeasonError::Data(_))));
    }
}
