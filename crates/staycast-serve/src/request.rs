//! Request and response types.
//!
//! A [`RawPredictionRequest`] is whatever arrived on the wire. Validation
//! turns it into a [`PredictionRequest`] with every required field present,
//! numbers finite and the date parsed strictly.

use crate::error::GatewayError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Request as received, before any field is checked.
///
/// Room counts distinguish an absent key (`None`, rejected) from an explicit
/// `null` (`Some(None)`, imputed).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPredictionRequest {
    /// Room type
    #[serde(default)]
    pub room_type: Option<String>,
    /// Guest capacity
    #[serde(default)]
    pub accommodates: Option<f64>,
    /// Bedroom count, may be null
    #[serde(default, deserialize_with = "present")]
    pub bedrooms: Option<Option<f64>>,
    /// Bathroom count, may be null
    #[serde(default, deserialize_with = "present")]
    pub bathrooms: Option<Option<f64>>,
    /// Bed count, may be null
    #[serde(default, deserialize_with = "present")]
    pub beds: Option<Option<f64>>,
    /// Neighbourhood
    #[serde(default, alias = "neighbourhood_cleansed")]
    pub neighbourhood: Option<String>,
    /// Date as `yyyy-mm-dd`
    #[serde(default, alias = "data")]
    pub date: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

/// Validated request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    /// Room type
    pub room_type: String,
    /// Guest capacity
    pub accommodates: f64,
    /// Bedroom count, imputed when `None`
    pub bedrooms: Option<f64>,
    /// Bathroom count, imputed when `None`
    pub bathrooms: Option<f64>,
    /// Bed count, imputed when `None`
    pub beds: Option<f64>,
    /// Neighbourhood
    pub neighbourhood: String,
    /// Requested date, any year
    pub date: NaiveDate,
}

impl RawPredictionRequest {
    /// Parse a JSON body.
    pub fn from_json(body: serde_json::Value) -> Result<Self, GatewayError> {
        if !body.is_object() {
            return Err(GatewayError::InputValidation(
                "request body must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(body).map_err(|e| GatewayError::InputValidation(e.to_string()))
    }

    /// Check required fields and parse the date.
    pub fn validate(self) -> Result<PredictionRequest, GatewayError> {
        let room_type = required("room_type", self.room_type)?;
        let neighbourhood = required("neighbourhood", self.neighbourhood)?;
        let accommodates = count("accommodates", required("accommodates", self.accommodates)?)?;
        let bedrooms = optional_count("bedrooms", self.bedrooms)?;
        let bathrooms = optional_count("bathrooms", self.bathrooms)?;
        let beds = optional_count("beds", self.beds)?;
        let date = parse_date(&required("date", self.date)?)?;

        Ok(PredictionRequest {
            room_type,
            accommodates,
            bedrooms,
            bathrooms,
            beds,
            neighbourhood,
            date,
        })
    }
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, GatewayError> {
    value.ok_or_else(|| GatewayError::InputValidation(format!("missing field `{field}`")))
}

fn count(field: &str, value: f64) -> Result<f64, GatewayError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(GatewayError::InputValidation(format!(
            "`{field}` must be a non-negative number, got {value}"
        )))
    }
}

fn optional_count(field: &str, value: Option<Option<f64>>) -> Result<Option<f64>, GatewayError> {
    required(field, value)?
        .map(|v| count(field, v))
        .transpose()
}

/// Parse a date in exactly the `yyyy-mm-dd` form.
///
/// Anything else, including `yyyy-m-d` or trailing text, is rejected rather
/// than guessed at.
pub fn parse_date(raw: &str) -> Result<NaiveDate, GatewayError> {
    let invalid = || GatewayError::InputValidation(format!("date {raw:?} is not yyyy-mm-dd"));

    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())
}

/// Successful gateway answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Nightly price, rounded to 2 decimals
    pub price: f64,
    /// `Low`, `Medium` or `High`
    pub season_label: String,
}

/// Error detail of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error name
    pub kind: String,
    /// Human-readable message
    pub message: String,
}

/// Failed gateway answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// What went wrong
    pub error: ErrorDetail,
}

impl From<&GatewayError> for ErrorResponse {
    fn from(err: &GatewayError) -> Self {
        Self {
            error: ErrorDetail {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn body() -> serde_json::Value {
        json!({
            "room_type": "Entire home/apt",
            "accommodates": 2,
            "bedrooms": null,
            "bathrooms": 1,
            "beds": null,
            "neighbourhood": "Centro",
            "date": "2025-06-15"
        })
    }

    #[test]
    fn test_valid_request() {
        let request = RawPredictionRequest::from_json(body())
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(request.accommodates, 2.0);
        assert_eq!(request.bedrooms, None);
        assert_eq!(request.bathrooms, Some(1.0));
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
    }

    #[test]
    fn test_aliases() {
        let request = RawPredictionRequest::from_json(json!({
            "room_type": "Private room",
            "accommodates": 1,
            "bedrooms": 1,
            "bathrooms": 1,
            "beds": 1,
            "neighbourhood_cleansed": "Retiro",
            "data": "2024-12-31"
        }))
        .unwrap()
        .validate()
        .unwrap();
        assert_eq!(request.neighbourhood, "Retiro");
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[rstest]
    #[case("room_type")]
    #[case("accommodates")]
    #[case("bedrooms")]
    #[case("bathrooms")]
    #[case("beds")]
    #[case("neighbourhood")]
    #[case("date")]
    fn test_absent_key_rejected(#[case] key: &str) {
        let mut value = body();
        value.as_object_mut().unwrap().remove(key);
        let err = RawPredictionRequest::from_json(value)
            .and_then(RawPredictionRequest::validate)
            .unwrap_err();
        assert_eq!(err.kind(), "input_validation");
        assert!(err.to_string().contains(key));
    }

    #[rstest]
    #[case(json!({"accommodates": "two"}))]
    #[case(json!({"accommodates": -1}))]
    #[case(json!({"beds": "x"}))]
    #[case(json!({"room_type": null}))]
    fn test_bad_values_rejected(#[case] patch: serde_json::Value) {
        let mut value = body();
        for (k, v) in patch.as_object().unwrap() {
            value[k] = v.clone();
        }
        let err = RawPredictionRequest::from_json(value)
            .and_then(RawPredictionRequest::validate)
            .unwrap_err();
        assert!(matches!(err, GatewayError::InputValidation(_)));
    }

    #[rstest]
    #[case("15-06-2025")]
    #[case("2025/06/15")]
    #[case("2025-6-15")]
    #[case("2025-06-15T00:00")]
    #[case(" 2025-06-15")]
    #[case("2025-02-30")]
    #[case("")]
    fn test_strict_date(#[case] raw: &str) {
        assert!(matches!(parse_date(raw), Err(GatewayError::InputValidation(_))));
    }

    #[test]
    fn test_non_object_body() {
        assert!(RawPredictionRequest::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::from(&GatewayError::ModelUnavailable))
            .unwrap();
        assert_eq!(body["error"]["kind"], "model_unavailable");
        assert_eq!(body["error"]["message"], "Model unavailable");
    }
}
