//! Predictor Gateway
//!
//! Per request:
//!
//! 1. normalize the date onto the canonical year
//! 2. look up its season
//! 3. compute `date_numeric` of the normalized date
//! 4. impute null room counts
//! 5. encode categorical fields with the frozen label store
//! 6. assemble the feature vector through the shared schema
//! 7. predict, invert the target transform, take the absolute value and
//!    round to cents
//!
//! The gateway holds no mutable state of its own; every request reads one
//! consistent artifact bundle from the slot.

use crate::artifacts::{ArtifactSlot, ServingArtifacts};
use crate::error::GatewayError;
use crate::request::{PredictionRequest, PredictionResponse, RawPredictionRequest};
use chrono::{Datelike, NaiveDate};
use staycast_features::{Column, FeatureVector, date_numeric, impute_request};
use staycast_season::Season;
use std::sync::Arc;
use tracing::debug;

/// A fully resolved prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Nightly price, rounded to 2 decimals
    pub price: f64,
    /// Season of the normalized date
    pub season: Season,
    /// Requested date moved onto the canonical year
    pub normalized_date: NaiveDate,
    /// Vector handed to the model
    pub features: FeatureVector,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            price: prediction.price,
            season_label: prediction.season.label().to_string(),
        }
    }
}

/// Serves price predictions from the artifacts in a slot.
#[derive(Debug, Clone)]
pub struct Gateway {
    slot: Arc<ArtifactSlot>,
}

impl Gateway {
    /// Create a gateway reading from `slot`.
    pub const fn new(slot: Arc<ArtifactSlot>) -> Self {
        Self { slot }
    }

    /// Artifact slot.
    pub fn slot(&self) -> &Arc<ArtifactSlot> {
        &self.slot
    }

    /// Predict a validated request.
    pub fn predict(&self, request: &PredictionRequest) -> Result<Prediction, GatewayError> {
        let artifacts = self.slot.current()?;
        predict_with(&artifacts, request)
    }

    /// Validate a JSON body and predict it.
    pub fn respond(&self, body: serde_json::Value) -> Result<PredictionResponse, GatewayError> {
        let request = RawPredictionRequest::from_json(body)?.validate()?;
        let prediction = self.predict(&request)?;
        Ok(prediction.into())
    }
}

/// Move a date onto `year`, keeping month and day.
///
/// February 29 lands on February 28 when `year` is not a leap year.
pub fn normalize_year(date: NaiveDate, year: i32) -> Option<NaiveDate> {
    date.with_year(year).or_else(|| {
        let leap_day = date.month() == 2 && date.day() == 29;
        leap_day.then(|| NaiveDate::from_ymd_opt(year, 2, 28)).flatten()
    })
}

/// Round to 2 decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn predict_with(
    artifacts: &ServingArtifacts,
    request: &PredictionRequest,
) -> Result<Prediction, GatewayError> {
    let canonical_year = artifacts.config().canonical_year;
    let normalized_date = normalize_year(request.date, canonical_year)
        .ok_or(GatewayError::MissingSeasonData(request.date))?;

    let season = artifacts
        .seasons()
        .get(normalized_date)
        .ok_or(GatewayError::MissingSeasonData(normalized_date))?;

    let rooms = impute_request(
        request.accommodates,
        request.bedrooms,
        request.bathrooms,
        request.beds,
    )?;

    let labels = artifacts.labels();
    let features = FeatureVector {
        room_type: labels.transform(Column::RoomType.name(), &request.room_type)?,
        accommodates: rooms.accommodates,
        bedrooms: rooms.bedrooms,
        bathrooms: rooms.bathrooms,
        beds: rooms.beds,
        neighbourhood: labels.transform(Column::Neighbourhood.name(), &request.neighbourhood)?,
        season,
        date_numeric: date_numeric(normalized_date),
    };

    let model = artifacts.model();
    let raw = model.predict(&features.to_array())?;
    let price = model.target_transform().inverse(raw);
    if !price.is_finite() {
        return Err(GatewayError::Model(format!(
            "non-finite prediction {raw} in target space"
        )));
    }
    let price = round_cents(price.abs());

    debug!(
        date = %request.date,
        normalized = %normalized_date,
        season = %season,
        price,
        "predicted price"
    );

    Ok(Prediction {
        price,
        season,
        normalized_date,
        features,
    })
}
