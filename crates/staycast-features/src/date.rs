//! Date to integer conversion.

use chrono::NaiveDate;

/// Fixed epoch for `date_numeric`.
pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(date) => date,
    None => panic!("invalid epoch"),
};

/// Whole days from 1970-01-01 to `date`.
pub fn date_numeric(date: NaiveDate) -> i64 {
    (date - EPOCH).num_days()
}
