//! Calendar aggregation pipeline.
//!
//! The approach:
//! 1. Discard records dated in or after the cutoff year
//! 2. Sum availability per date across all listings
//! 3. Smooth with a trailing rolling mean
//! 4. Fit quantile thresholds on the smoothed series
//! 5. Classify every smoothed day into a season
//! 6. Require a season for every day of the canonical year

use crate::classify::SeasonThresholds;
use crate::error::SeasonError;
use crate::index::SeasonIndex;
use crate::series::{DailySeries, aggregate, rolling_mean};
use serde::{Deserialize, Serialize};
use staycast_data::CalendarRecord;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Configuration for season derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    /// Rolling window in days (default: 14)
    pub window: usize,

    /// Minimum observations for a rolling value (default: 1)
    /// With 1, the first `window - 1` days use partial windows
    pub min_periods: usize,

    /// Quantile at or above which a day is `Low` season (default: 0.66)
    pub low_quantile: f64,

    /// Quantile below which a day is `High` season (default: 0.33)
    pub high_quantile: f64,

    /// Records dated in this year or later are discarded (default: 2026)
    pub cutoff_year: i32,

    /// Training year serving dates are normalized onto (default: 2025)
    pub canonical_year: i32,

    /// Fail when a canonical-year day has no season (default: true)
    pub require_full_year: bool,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            window: 14,
            min_periods: 1,
            low_quantile: 0.66,
            high_quantile: 0.33,
            cutoff_year: 2026,
            canonical_year: 2025,
            require_full_year: true,
        }
    }
}

/// Everything produced by one aggregation run.
#[derive(Debug, Clone)]
pub struct SeasonReport {
    /// Summed availability per day
    pub daily: DailySeries,
    /// Smoothed availability per day
    pub smoothed: DailySeries,
    /// Fitted thresholds
    pub thresholds: SeasonThresholds,
    /// Resulting date-to-season mapping
    pub index: SeasonIndex,
}

/// Derives the season index from cleaned calendar records.
#[derive(Debug, Clone)]
pub struct CalendarAggregator {
    config: SeasonConfig,
}

impl CalendarAggregator {
    /// Create a new aggregator with the given configuration
    pub fn new(config: SeasonConfig) -> Result<Self, SeasonError> {
        if config.window == 0 {
            return Err(SeasonError::InvalidParameter(
                "window must be at least 1".to_string(),
            ));
        }
        if config.min_periods == 0 || config.min_periods > config.window {
            return Err(SeasonError::InvalidParameter(
                "min_periods must be between 1 and window".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.high_quantile)
            || !(0.0..=1.0).contains(&config.low_quantile)
        {
            return Err(SeasonError::InvalidParameter(
                "quantiles must be within [0, 1]".to_string(),
            ));
        }
        if config.high_quantile > config.low_quantile {
            return Err(SeasonError::InvalidParameter(
                "high_quantile must not exceed low_quantile".to_string(),
            ));
        }
        if config.canonical_year >= config.cutoff_year {
            return Err(SeasonError::InvalidParameter(
                "canonical_year must fall before cutoff_year".to_string(),
            ));
        }

        Ok(Self { config })
    }

    /// Create an aggregator with default configuration.
    ///
    /// # Errors
    /// Returns an error if the default configuration is invalid (should not happen).
    pub fn try_default() -> Result<Self, SeasonError> {
        Self::new(SeasonConfig::default())
    }

    /// Get the current configuration
    pub const fn config(&self) -> &SeasonConfig {
        &self.config
    }

    /// Sum availability per date, after the cutoff filter.
    pub fn aggregate(&self, records: &[CalendarRecord]) -> Result<DailySeries, SeasonError> {
        aggregate(records, self.config.cutoff_year)
    }

    /// Smooth a daily series with the configured rolling window.
    pub fn smooth(&self, daily: &DailySeries) -> Result<DailySeries, SeasonError> {
        rolling_mean(daily, self.config.window, self.config.min_periods)
    }

    /// Fit thresholds on a smoothed series and classify each day.
    ///
    /// Days whose smoothed value is undefined (fewer than `min_periods`
    /// observations) get no entry.
    pub fn classify(
        &self,
        smoothed: &DailySeries,
    ) -> Result<(SeasonThresholds, SeasonIndex), SeasonError> {
        let thresholds = SeasonThresholds::fit(
            smoothed.values(),
            self.config.low_quantile,
            self.config.high_quantile,
        )?;

        let seasons: BTreeMap<_, _> = smoothed
            .iter()
            .filter(|(_, value)| !value.is_nan())
            .map(|(date, value)| (date, thresholds.classify(value)))
            .collect();

        Ok((
            thresholds,
            SeasonIndex::new(self.config.canonical_year, seasons),
        ))
    }

    /// Run the full aggregation over cleaned records.
    ///
    /// # Errors
    ///
    /// [`SeasonError::IncompleteCoverage`] when `require_full_year` is set
    /// and some canonical-year day ends up without a season.
    pub fn run(&self, records: &[CalendarRecord]) -> Result<SeasonReport, SeasonError> {
        let daily = self.aggregate(records)?;
        if daily.is_empty() {
            return Err(SeasonError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let smoothed = self.smooth(&daily)?;
        let (thresholds, index) = self.classify(&smoothed)?;

        let [low, medium, high] = index.counts();
        info!(
            days = daily.len(),
            low_threshold = thresholds.low_season,
            high_threshold = thresholds.high_season,
            low,
            medium,
            high,
            "derived season index"
        );

        let year = self.config.canonical_year;
        let gaps = index.coverage_gaps(year);
        if let Some(&first) = gaps.first() {
            if self.config.require_full_year {
                return Err(SeasonError::IncompleteCoverage {
                    year,
                    missing: gaps.len(),
                    first,
                });
            }
            warn!(
                year,
                missing_days = gaps.len(),
                "season index does not cover the full canonical year"
            );
        }

        Ok(SeasonReport {
            daily,
            smoothed,
            thresholds,
            index,
        })
    }
}
