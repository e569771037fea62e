//! Target transforms.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transform applied to prices before fitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTransform {
    /// Fit on raw prices
    Identity,
    /// Fit on `ln(1 + price)`
    #[default]
    Log1p,
}

impl TargetTransform {
    /// Price to target space.
    pub fn forward(&self, price: f64) -> Result<f64> {
        let value = match self {
            Self::Identity => price,
            Self::Log1p => price.ln_1p(),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFinite(format!(
                "{self} of price {price}"
            )))
        }
    }

    /// Target space back to price.
    pub fn inverse(&self, value: f64) -> f64 {
        match self {
            Self::Identity => value,
            Self::Log1p => value.exp_m1(),
        }
    }
}

impl fmt::Display for TargetTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Log1p => write!(f, "log1p"),
        }
    }
}
