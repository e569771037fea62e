//! Demand-season classification.
//!
//! Seasons are derived from smoothed availability, which runs opposite to
//! demand: the more listings are open on a day, the lower the season.
//! Two quantiles of the smoothed series split it into terciles:
//!
//! | smoothed value `v`            | season        |
//! |-------------------------------|---------------|
//! | `v >= q_low`                  | `Low` (0)     |
//! | `q_high <= v < q_low`         | `Medium` (1)  |
//! | `v < q_high`                  | `High` (2)    |
//!
//! Equality always resolves toward the lower-demand bucket.

use crate::error::SeasonError;
use ndarray::Array1;
use polars::prelude::{Column, DataFrame, IntoLazy, QuantileMethod, col, lit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Demand season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Season {
    /// High availability, low demand
    Low,
    /// Middle tercile
    Medium,
    /// Scarce availability, high demand
    High,
}

impl Season {
    /// Returns all seasons in code order.
    pub const fn all() -> [Self; 3] {
        [Self::Low, Self::Medium, Self::High]
    }

    /// Numeric code used in the feature vector.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    /// Parse a season from its code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Low),
            1 => Some(Self::Medium),
            2 => Some(Self::High),
            _ => None,
        }
    }

    /// Human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<Season> for u8 {
    fn from(season: Season) -> Self {
        season.code()
    }
}

impl TryFrom<u8> for Season {
    type Error = SeasonError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(SeasonError::InvalidCode(code))
    }
}

/// Quantile with linear interpolation between closest ranks.
///
/// NaN values are ignored. Returns `None` when no finite value remains.
pub fn quantile(values: &Array1<f64>, q: f64) -> Result<Option<f64>, SeasonError> {
    let present: Vec<Option<f64>> = values.iter().map(|v| (!v.is_nan()).then_some(*v)).collect();
    let frame = DataFrame::new(vec![Column::new("value".into(), present)])?;

    let out = frame
        .lazy()
        .select([col("value").quantile(lit(q.clamp(0.0, 1.0)), QuantileMethod::Linear)])
        .collect()?;

    Ok(out.column("value")?.f64()?.get(0))
}

/// Cut points separating the three seasons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonThresholds {
    /// Values at or above this are `Low` season (the upper quantile)
    pub low_season: f64,
    /// Values below this are `High` season (the lower quantile)
    pub high_season: f64,
}

impl SeasonThresholds {
    /// Fit thresholds from a smoothed series.
    pub fn fit(
        smoothed: &Array1<f64>,
        low_quantile: f64,
        high_quantile: f64,
    ) -> Result<Self, SeasonError> {
        let missing = || SeasonError::InsufficientData {
            required: 1,
            actual: 0,
        };

        Ok(Self {
            low_season: quantile(smoothed, low_quantile)?.ok_or_else(missing)?,
            high_season: quantile(smoothed, high_quantile)?.ok_or_else(missing)?,
        })
    }

    /// Classify one smoothed availability value.
    pub fn classify(&self, value: f64) -> Season {
        if value >= self.low_season {
            Season::Low
        } else if value >= self.high_season {
            Season::Medium
        } else {
            Season::High
        }
    }
}
