//! Standard Scaler
//!
//! Centers each feature on its training mean and divides by its population
//! standard deviation. Constant features keep a scale of 1.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Per-feature mean and scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on the rows of `x`.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(ModelError::EmptyData(
                "cannot fit scaler on empty data".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ModelError::EmptyData("no rows".to_string()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });

        Ok(Self {
            mean: mean.to_vec(),
            scale: scale.to_vec(),
        })
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Per-feature means.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Per-feature scales.
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width == self.n_features() && self.scale.len() == width {
            Ok(())
        } else {
            Err(ModelError::DimensionMismatch(format!(
                "scaler fit on {} features, got {width}",
                self.n_features()
            )))
        }
    }

    /// Scale every row of `x`.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        let mean = ArrayView1::from(self.mean.as_slice());
        let scale = ArrayView1::from(self.scale.as_slice());
        Ok((x - &mean) / &scale)
    }

    /// Scale one feature vector.
    pub fn transform_row(&self, row: &[f64]) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }
}
