//! Feature Builder
//!
//! Joins listings onto calendar records and produces the training matrix:
//!
//! 1. left join listings to calendar records by listing id
//! 2. drop rows at or beyond the horizon year
//! 3. attach the season of each date
//! 4. stable sort by date
//! 5. impute room counts
//! 6. fit the label store and encode categorical columns
//!
//! The join and the ordering run as polars lazy frames over row positions;
//! the matched rows are then read back from the input slices.

use crate::date::date_numeric;
use crate::error::FeatureError;
use crate::impute::{Rooms, impute};
use crate::labels::LabelStore;
use crate::matrix::{TrainingMatrix, TrainingRow};
use crate::schema::{CATEGORICAL_COLUMNS, Column};
use chrono::NaiveDate;
use polars::prelude::{
    DataFrame, IntoLazy, JoinArgs, JoinType, LazyFrame, NamedFrom, Series, SortMultipleOptions,
    col, lit,
};
use serde::{Deserialize, Serialize};
use staycast_data::{CalendarRecord, ListingAttributes};
use staycast_season::{Season, SeasonIndex};
use tracing::{info, warn};

/// Configuration for [`FeatureBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Rows dated in this year or later are excluded
    pub cutoff_year: i32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { cutoff_year: 2026 }
    }
}

/// Row counts observed while building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Rows produced by the join
    pub joined: usize,
    /// Listings with no calendar record
    pub unmatched_listings: usize,
    /// Rows dropped by the horizon filter
    pub beyond_horizon: usize,
    /// Rows kept without a target price
    pub missing_target: usize,
}

/// Output of a build: the matrix and the vocabularies used to encode it.
#[derive(Debug, Clone)]
pub struct FeatureBuild {
    /// Training matrix ordered by date
    pub matrix: TrainingMatrix,
    /// Label store fit on the matrix rows
    pub labels: LabelStore,
    /// Row counts
    pub stats: BuildStats,
}

struct JoinedRow<'a> {
    listing: &'a ListingAttributes,
    record: &'a CalendarRecord,
    season: Season,
}

/// Builds the training matrix from listings, calendar records and seasons.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    /// Create a builder.
    pub const fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Get configuration.
    pub const fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Build the training matrix and fit the label store.
    ///
    /// # Errors
    ///
    /// - [`FeatureError::EmptyData`] when no row survives the horizon filter
    /// - [`FeatureError::MissingSeason`] when a kept date has no season
    /// - [`FeatureError::NumericCoercion`] when a room count cannot be imputed
    pub fn build(
        &self,
        listings: &[ListingAttributes],
        calendar: &[CalendarRecord],
        seasons: &SeasonIndex,
    ) -> Result<FeatureBuild, FeatureError> {
        let mut stats = BuildStats::default();
        let cutoff = self.config.cutoff_year;
        let cutoff_day = NaiveDate::from_ymd_opt(cutoff, 1, 1)
            .map(date_numeric)
            .ok_or_else(|| FeatureError::EmptyData(format!("no dates before {cutoff}")))?;

        let joined = left_join(listings, calendar)?.collect()?;
        stats.joined = joined.height();
        stats.unmatched_listings = joined.column("calendar_row")?.null_count();

        let horizon = joined
            .lazy()
            .filter(col("day").lt(lit(cutoff_day)))
            .collect()?;
        stats.beyond_horizon = stats.joined - stats.unmatched_listings - horizon.height();

        if horizon.height() == 0 {
            return Err(FeatureError::EmptyData(format!(
                "no calendar rows before {cutoff}"
            )));
        }

        // stable: listing order, then calendar order, among equal dates
        let ordered = horizon
            .lazy()
            .join(
                season_frame(seasons)?.lazy(),
                [col("day")],
                [col("day")],
                JoinArgs::new(JoinType::Left),
            )
            .sort(
                ["day", "listing_row", "calendar_row"],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;
        let kept = resolve(&ordered, listings, calendar)?;

        let rooms: Vec<Rooms> = kept
            .iter()
            .map(|row| Rooms {
                accommodates: row.listing.accommodates.clone(),
                bedrooms: row.listing.bedrooms.clone(),
                bathrooms: row.listing.bathrooms.clone(),
                beds: row.listing.beds.clone(),
            })
            .collect();
        let imputed = impute(&rooms)?;

        let mut labels = LabelStore::new();
        for column in CATEGORICAL_COLUMNS {
            labels.fit(
                column.name(),
                kept.iter().map(|row| categorical(row.listing, column)),
            )?;
        }

        let rows = kept
            .iter()
            .zip(imputed)
            .map(|(row, rooms)| {
                let date = row.record.date;
                Ok(TrainingRow {
                    room_type: labels
                        .transform(Column::RoomType.name(), &row.listing.room_type)?,
                    accommodates: rooms.accommodates,
                    bedrooms: rooms.bedrooms,
                    bathrooms: rooms.bathrooms,
                    beds: rooms.beds,
                    neighbourhood: labels
                        .transform(Column::Neighbourhood.name(), &row.listing.neighbourhood)?,
                    id: row.listing.id,
                    date,
                    date_numeric: date_numeric(date),
                    season: row.season,
                    adjusted_price: row.record.adjusted_price,
                    listing_id: row.record.listing_id,
                })
            })
            .collect::<Result<Vec<_>, FeatureError>>()?;

        let matrix = TrainingMatrix::new(rows);
        stats.missing_target = matrix.missing_targets();

        if stats.unmatched_listings > 0 {
            warn!(
                listings = stats.unmatched_listings,
                "listings without calendar records"
            );
        }
        info!(
            rows = matrix.len(),
            joined = stats.joined,
            beyond_horizon = stats.beyond_horizon,
            missing_target = stats.missing_target,
            "built training matrix"
        );

        Ok(FeatureBuild {
            matrix,
            labels,
            stats,
        })
    }
}

fn categorical(listing: &ListingAttributes, column: Column) -> &str {
    match column {
        Column::Neighbourhood => &listing.neighbourhood,
        _ => &listing.room_type,
    }
}

/// Listings left-joined to calendar records on the listing id.
///
/// Rows carry positions into the input slices. A listing without records
/// keeps one row with null `calendar_row` and `day`.
fn left_join(
    listings: &[ListingAttributes],
    calendar: &[CalendarRecord],
) -> Result<LazyFrame, FeatureError> {
    let listing_frame = DataFrame::new(vec![
        Series::new(
            "listing_id".into(),
            listings.iter().map(|l| l.id).collect::<Vec<u64>>(),
        )
        .into(),
        Series::new(
            "listing_row".into(),
            (0..listings.len() as u64).collect::<Vec<u64>>(),
        )
        .into(),
    ])?;
    let calendar_frame = DataFrame::new(vec![
        Series::new(
            "listing_id".into(),
            calendar.iter().map(|r| r.listing_id).collect::<Vec<u64>>(),
        )
        .into(),
        Series::new(
            "calendar_row".into(),
            (0..calendar.len() as u64).collect::<Vec<u64>>(),
        )
        .into(),
        Series::new(
            "day".into(),
            calendar.iter().map(|r| date_numeric(r.date)).collect::<Vec<i64>>(),
        )
        .into(),
    ])?;

    Ok(listing_frame.lazy().join(
        calendar_frame.lazy(),
        [col("listing_id")],
        [col("listing_id")],
        JoinArgs::new(JoinType::Left),
    ))
}

fn season_frame(seasons: &SeasonIndex) -> Result<DataFrame, FeatureError> {
    let (days, codes): (Vec<i64>, Vec<u32>) = seasons
        .iter()
        .map(|(date, season)| (date_numeric(date), u32::from(season.code())))
        .unzip();

    Ok(DataFrame::new(vec![
        Series::new("day".into(), days).into(),
        Series::new("season".into(), codes).into(),
    ])?)
}

/// Read the ordered frame back into rows over the input slices.
fn resolve<'a>(
    ordered: &DataFrame,
    listings: &'a [ListingAttributes],
    calendar: &'a [CalendarRecord],
) -> Result<Vec<JoinedRow<'a>>, FeatureError> {
    let listing_rows = ordered.column("listing_row")?.u64()?;
    let calendar_rows = ordered.column("calendar_row")?.u64()?;
    let codes = ordered.column("season")?.u32()?;

    let lost = || FeatureError::EmptyData("joined row lost its source position".to_string());

    listing_rows
        .into_iter()
        .zip(calendar_rows)
        .zip(codes)
        .map(|((listing_row, calendar_row), code)| {
            let listing = listing_row
                .and_then(|i| listings.get(i as usize))
                .ok_or_else(lost)?;
            let record = calendar_row
                .and_then(|i| calendar.get(i as usize))
                .ok_or_else(lost)?;
            let season = code
                .and_then(|c| u8::try_from(c).ok())
                .and_then(Season::from_code)
                .ok_or(FeatureError::MissingSeason(record.date))?;
            Ok(JoinedRow {
                listing,
                record,
                season,
            })
        })
        .collect()
}
