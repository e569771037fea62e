//! The persisted date-to-season mapping.

use crate::classify::Season;
use crate::error::SeasonError;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use staycast_data::artifact::{check_version, read_json, write_json};
use std::collections::BTreeMap;
use std::path::Path;

/// Artifact format version written by this build.
pub const SEASON_INDEX_VERSION: u32 = 1;

/// Immutable mapping from calendar date to season.
///
/// Built once over the full history and only read afterwards; there is no
/// way to insert into an existing index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonIndex {
    canonical_year: i32,
    seasons: BTreeMap<NaiveDate, Season>,
}

#[derive(Serialize, Deserialize)]
struct SeasonIndexFile {
    version: u32,
    canonical_year: i32,
    seasons: BTreeMap<NaiveDate, Season>,
}

impl SeasonIndex {
    /// Create an index for the given canonical training year.
    pub const fn new(canonical_year: i32, seasons: BTreeMap<NaiveDate, Season>) -> Self {
        Self {
            canonical_year,
            seasons,
        }
    }

    /// The single training year every serving date is normalized onto.
    pub const fn canonical_year(&self) -> i32 {
        self.canonical_year
    }

    /// Season for a date.
    pub fn get(&self, date: NaiveDate) -> Option<Season> {
        self.seasons.get(&date).copied()
    }

    /// Number of dated entries.
    pub fn len(&self) -> usize {
        self.seasons.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    /// Iterate entries in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Season)> + '_ {
        self.seasons.iter().map(|(d, s)| (*d, *s))
    }

    /// Number of days assigned to each season, indexed by season code.
    pub fn counts(&self) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for season in self.seasons.values() {
            counts[season.code() as usize] += 1;
        }
        counts
    }

    /// Days of `year` that have no entry.
    pub fn coverage_gaps(&self, year: i32) -> Vec<NaiveDate> {
        let (Some(first), Some(next)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year + 1, 1, 1),
        ) else {
            return Vec::new();
        };

        (0..(next - first).num_days())
            .map(|offset| first + Duration::days(offset))
            .filter(|date| !self.seasons.contains_key(date))
            .collect()
    }

    /// Persist as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SeasonError> {
        let file = SeasonIndexFile {
            version: SEASON_INDEX_VERSION,
            canonical_year: self.canonical_year,
            seasons: self.seasons.clone(),
        };
        Ok(write_json(path, &file)?)
    }

    /// Load a persisted index.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SeasonError> {
        let file: SeasonIndexFile = read_json(path)?;
        check_version("season index", file.version, SEASON_INDEX_VERSION)?;
        Ok(Self::new(file.canonical_year, file.seasons))
    }
}
