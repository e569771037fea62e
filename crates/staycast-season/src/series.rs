//! Daily availability series.

use crate::error::SeasonError;
use chrono::{Datelike, Duration, NaiveDate};
use ndarray::Array1;
use polars::prelude::{
    ChunkAgg, Column, DataFrame, IntoLazy, JoinArgs, JoinType, RollingOptionsFixedWindow,
    SortMultipleOptions, col, lit,
};
use staycast_data::CalendarRecord;

/// A dense daily series starting at `start`, one value per calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    start: NaiveDate,
    values: Array1<f64>,
}

impl DailySeries {
    /// Create a series from a start date and consecutive daily values.
    pub const fn new(start: NaiveDate, values: Array1<f64>) -> Self {
        Self { start, values }
    }

    /// First date of the series.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date of the series, if any.
    pub fn end(&self) -> Option<NaiveDate> {
        self.len()
            .checked_sub(1)
            .map(|last| self.start + Duration::days(last as i64))
    }

    /// Daily values.
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Number of days.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no days.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(date, value)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (self.start + Duration::days(i as i64), v))
    }
}

/// Day number used as the polars join and sort key.
fn day_key(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

fn from_day_key(key: i64) -> Result<NaiveDate, SeasonError> {
    i32::try_from(key)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| SeasonError::InvalidParameter(format!("day {key} is out of range")))
}

/// Sum availability per calendar date across all listings.
///
/// Records dated in or after `cutoff_year` are discarded first. The result
/// spans every day from the first to the last remaining date; a day with no
/// records is a zero, not a hole, so it still occupies a slot in any later
/// rolling window. Duplicate `(listing, date)` rows are summed as they come.
pub fn aggregate(
    records: &[CalendarRecord],
    cutoff_year: i32,
) -> Result<DailySeries, SeasonError> {
    let cutoff = NaiveDate::from_ymd_opt(cutoff_year, 1, 1)
        .map(day_key)
        .ok_or_else(|| SeasonError::InvalidParameter(format!("cutoff year {cutoff_year}")))?;

    let days: Vec<i64> = records.iter().map(|r| day_key(r.date)).collect();
    let available: Vec<f64> = records
        .iter()
        .map(|r| f64::from(r.available.unwrap_or(0)))
        .collect();
    let raw = DataFrame::new(vec![
        Column::new("day".into(), days),
        Column::new("available".into(), available),
    ])?;

    let totals = raw
        .lazy()
        .filter(col("day").lt(lit(cutoff)))
        .group_by([col("day")])
        .agg([col("available").sum()])
        .collect()?;

    let keys = totals.column("day")?.i64()?;
    let (Some(first), Some(last)) = (keys.min(), keys.max()) else {
        return Ok(DailySeries::new(NaiveDate::default(), Array1::zeros(0)));
    };

    // Dense calendar so empty days become zeros
    let calendar = DataFrame::new(vec![Column::new(
        "day".into(),
        (first..=last).collect::<Vec<i64>>(),
    )])?;
    let dense = calendar
        .lazy()
        .join(
            totals.lazy(),
            [col("day")],
            [col("day")],
            JoinArgs::new(JoinType::Left),
        )
        .with_column(col("available").fill_null(lit(0.0)))
        .sort(["day"], SortMultipleOptions::default().with_maintain_order(true))
        .collect()?;

    let values: Array1<f64> = dense
        .column("available")?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();

    Ok(DailySeries::new(from_day_key(first)?, values))
}

/// Trailing rolling mean.
///
/// Day `i` averages the `window` days ending at `i`. Early days use the
/// partial window once it holds `min_periods` observations; before that the
/// value is NaN.
pub fn rolling_mean(
    series: &DailySeries,
    window: usize,
    min_periods: usize,
) -> Result<DailySeries, SeasonError> {
    let frame = DataFrame::new(vec![Column::new(
        "value".into(),
        series.values().to_vec(),
    )])?;

    let smoothed = frame
        .lazy()
        .select([col("value")
            .rolling_mean(RollingOptionsFixedWindow {
                window_size: window,
                min_periods,
                ..Default::default()
            })
            .alias("smoothed")])
        .collect()?;

    let values: Array1<f64> = smoothed
        .column("smoothed")?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();

    Ok(DailySeries::new(series.start(), values))
}
