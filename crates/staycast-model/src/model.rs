//! The model seam between training and serving.

use crate::error::{ModelError, Result};
use crate::lineage::Lineage;
use crate::transform::TargetTransform;
use ndarray::{Array1, Array2};
use std::fmt::Debug;

/// Summary of a fit, measured in price space.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// Rows used
    pub rows: usize,
    /// Epochs run
    pub epochs: usize,
    /// Whether the optimizer met its tolerance
    pub converged: bool,
    /// In-sample root mean squared error
    pub rmse: f64,
    /// In-sample coefficient of determination
    pub r2: f64,
}

/// A price regression model.
///
/// Implementations are fit once offline and then shared read-only across
/// serving threads.
pub trait PriceModel: Send + Sync + Debug {
    /// Feature names in the order [`PriceModel::predict`] expects them.
    fn feature_names(&self) -> &[String];

    /// Transform applied to prices before fitting.
    fn target_transform(&self) -> TargetTransform;

    /// Season index and vocabularies the model was trained against.
    fn lineage(&self) -> Option<&Lineage> {
        None
    }

    /// Fit on features and prices. Prices are in price space; the model
    /// applies its own target transform.
    fn fit(&mut self, x: &Array2<f64>, prices: &Array1<f64>) -> Result<FitReport>;

    /// Predict one feature vector. The result is in target space.
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Predict every row of `x`, in target space.
    fn predict_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        x.rows()
            .into_iter()
            .map(|row| {
                row.as_slice().map_or_else(
                    || self.predict(&row.to_vec()),
                    |values| self.predict(values),
                )
            })
            .collect()
    }

    /// Predict one feature vector in price space.
    fn predict_price(&self, features: &[f64]) -> Result<f64> {
        let price = self.target_transform().inverse(self.predict(features)?);
        if price.is_finite() {
            Ok(price)
        } else {
            Err(ModelError::NonFinite(format!("predicted price {price}")))
        }
    }
}
