//! Linear price model
//!
//! Standardized features, SGD-fit weights, and a target transform, persisted
//! together with the feature names and the preprocessing lineage they were
//! trained on.

use crate::error::{ModelError, Result};
use crate::lineage::Lineage;
use crate::metrics::{r2, rmse};
use crate::model::{FitReport, PriceModel};
use crate::scaler::StandardScaler;
use crate::sgd::{SgdConfig, SgdRegressor};
use crate::transform::TargetTransform;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use staycast_data::artifact::{check_version, read_json, write_json};
use std::path::Path;
use tracing::info;

/// Artifact format version written by this build.
pub const MODEL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
struct Fitted {
    scaler: StandardScaler,
    coef: Array1<f64>,
    intercept: f64,
}

/// Linear regression on standardized features.
#[derive(Debug, Clone)]
pub struct LinearModel {
    feature_names: Vec<String>,
    target: TargetTransform,
    regressor: SgdRegressor,
    fitted: Option<Fitted>,
    lineage: Option<Lineage>,
}

#[derive(Serialize, Deserialize)]
struct LinearModelFile {
    version: u32,
    feature_names: Vec<String>,
    target: TargetTransform,
    scaler: StandardScaler,
    coef: Vec<f64>,
    intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lineage: Option<Lineage>,
}

impl LinearModel {
    /// Create an unfitted model.
    pub fn new<S: AsRef<str>>(
        feature_names: &[S],
        config: SgdConfig,
        target: TargetTransform,
    ) -> Result<Self> {
        if feature_names.is_empty() {
            return Err(ModelError::EmptyData("no feature names".to_string()));
        }
        Ok(Self {
            feature_names: feature_names
                .iter()
                .map(|n| n.as_ref().to_string())
                .collect(),
            target,
            regressor: SgdRegressor::new(config)?,
            fitted: None,
            lineage: None,
        })
    }

    /// Attach the preprocessing lineage.
    pub fn with_lineage(mut self, lineage: Lineage) -> Self {
        self.lineage = Some(lineage);
        self
    }

    /// Replace the preprocessing lineage.
    pub fn set_lineage(&mut self, lineage: Lineage) {
        self.lineage = Some(lineage);
    }

    /// Whether [`PriceModel::fit`] has run.
    pub const fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Weights in standardized feature space.
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.coef)
    }

    /// Bias term.
    pub fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.intercept)
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(ModelError::NotFitted)
    }

    /// Persist as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let fitted = self.fitted()?;
        let file = LinearModelFile {
            version: MODEL_VERSION,
            feature_names: self.feature_names.clone(),
            target: self.target,
            scaler: fitted.scaler.clone(),
            coef: fitted.coef.to_vec(),
            intercept: fitted.intercept,
            lineage: self.lineage.clone(),
        };
        Ok(write_json(path, &file)?)
    }

    /// Load a persisted model, checking its feature names against the
    /// order the caller assembles vectors in.
    pub fn load<P: AsRef<Path>, S: AsRef<str>>(path: P, expected: &[S]) -> Result<Self> {
        let file: LinearModelFile = read_json(path)?;
        check_version("model", file.version, MODEL_VERSION)?;

        let matches = file.feature_names.len() == expected.len()
            && file
                .feature_names
                .iter()
                .zip(expected)
                .all(|(found, want)| found == want.as_ref());
        if !matches {
            return Err(ModelError::FeatureMismatch {
                expected: expected.iter().map(|s| s.as_ref().to_string()).collect(),
                found: file.feature_names,
            });
        }

        let width = file.feature_names.len();
        if file.coef.len() != width || file.scaler.n_features() != width {
            return Err(ModelError::DimensionMismatch(format!(
                "{width} features, {} weights, scaler of {}",
                file.coef.len(),
                file.scaler.n_features()
            )));
        }

        Ok(Self {
            feature_names: file.feature_names,
            target: file.target,
            regressor: SgdRegressor::try_default()?,
            fitted: Some(Fitted {
                scaler: file.scaler,
                coef: Array1::from(file.coef),
                intercept: file.intercept,
            }),
            lineage: file.lineage,
        })
    }
}

impl PriceModel for LinearModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn target_transform(&self) -> TargetTransform {
        self.target
    }

    fn lineage(&self) -> Option<&Lineage> {
        self.lineage.as_ref()
    }

    fn fit(&mut self, x: &Array2<f64>, prices: &Array1<f64>) -> Result<FitReport> {
        if x.ncols() != self.feature_names.len() {
            return Err(ModelError::DimensionMismatch(format!(
                "expected {} features, got {}",
                self.feature_names.len(),
                x.ncols()
            )));
        }

        let y = prices
            .iter()
            .map(|&p| self.target.forward(p))
            .collect::<Result<Array1<f64>>>()?;

        let scaler = StandardScaler::fit(x)?;
        let z = scaler.transform(x)?;
        let sgd = self.regressor.fit(&z, &y)?;

        let predicted = (z.dot(&sgd.coef) + sgd.intercept).mapv(|v| self.target.inverse(v));
        let report = FitReport {
            rows: x.nrows(),
            epochs: sgd.epochs,
            converged: sgd.converged,
            rmse: rmse(prices, &predicted).unwrap_or(f64::NAN),
            r2: r2(prices, &predicted).unwrap_or(f64::NAN),
        };

        self.fitted = Some(Fitted {
            scaler,
            coef: sgd.coef,
            intercept: sgd.intercept,
        });

        info!(
            rows = report.rows,
            epochs = report.epochs,
            rmse = report.rmse,
            r2 = report.r2,
            target = %self.target,
            "fitted linear price model"
        );
        Ok(report)
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        let fitted = self.fitted()?;
        let z = fitted.scaler.transform_row(features)?;
        Ok(z.dot(&fitted.coef) + fitted.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NAMES: [&str; 2] = ["size", "rooms"];

    fn data() -> (Array2<f64>, Array1<f64>) {
        let n = 120;
        let mut x = Array2::zeros((n, 2));
        let mut prices = Array1::zeros(n);
        for i in 0..n {
            let size = 20.0 + (i % 40) as f64;
            let rooms = 1.0 + (i % 3) as f64;
            x[[i, 0]] = size;
            x[[i, 1]] = rooms;
            prices[i] = 2.0 * size + 15.0 * rooms + 10.0;
        }
        (x, prices)
    }

    fn fitted_model(target: TargetTransform) -> LinearModel {
        let (x, prices) = data();
        let config = SgdConfig {
            max_iter: 300,
            tol: None,
            alpha: 0.0,
            ..SgdConfig::default()
        };
        let mut model = LinearModel::new(&NAMES, config, target).unwrap();
        model.fit(&x, &prices).unwrap();
        model
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LinearModel::new(&NAMES, SgdConfig::default(), TargetTransform::Log1p).unwrap();
        assert!(matches!(model.predict(&[1.0, 2.0]), Err(ModelError::NotFitted)));
    }

    #[test]
    fn test_identity_fit_is_accurate() {
        let model = fitted_model(TargetTransform::Identity);
        let price = model.predict_price(&[30.0, 2.0]).unwrap();
        assert_relative_eq!(price, 100.0, epsilon = 0.5);
    }

    #[test]
    fn test_log_target_predicts_in_target_space() {
        let model = fitted_model(TargetTransform::Log1p);
        let raw = model.predict(&[30.0, 2.0]).unwrap();
        let price = model.predict_price(&[30.0, 2.0]).unwrap();
        assert_relative_eq!(price, raw.exp_m1());
        assert!(price > 50.0 && price < 200.0);
    }

    #[test]
    fn test_batch_matches_single() {
        let model = fitted_model(TargetTransform::Log1p);
        let (x, _) = data();
        let batch = model.predict_batch(&x).unwrap();
        assert_relative_eq!(batch[5], model.predict(&[x[[5, 0]], x[[5, 1]]]).unwrap());
    }

    #[test]
    fn test_save_load_checks_names() {
        let model = fitted_model(TargetTransform::Log1p);
        let dir = std::env::temp_dir().join(format!("staycast-model-{}", std::process::id()));
        let path = dir.join("model.json");
        model.save(&path).unwrap();

        let loaded = LinearModel::load(&path, &NAMES).unwrap();
        assert_relative_eq!(
            loaded.predict(&[30.0, 2.0]).unwrap(),
            model.predict(&[30.0, 2.0]).unwrap(),
            epsilon = 1e-9
        );
        assert_eq!(loaded.target_transform(), TargetTransform::Log1p);

        assert!(matches!(
            LinearModel::load(&path, &["rooms", "size"]),
            Err(ModelError::FeatureMismatch { .. })
        ));

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["target"], "log1p");
        assert_eq!(json["feature_names"][0], "size");
        assert!(json.get("lineage").is_none());
        assert!(loaded.lineage().is_none());

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_lineage_persists() {
        let lineage = Lineage {
            canonical_year: 2025,
            seasons: "012".to_string(),
            vocabularies: std::collections::BTreeMap::from([(
                "room_type".to_string(),
                vec!["Entire home/apt".to_string(), "Private room".to_string()],
            )]),
        };
        let model = fitted_model(TargetTransform::Log1p).with_lineage(lineage.clone());
        let dir = std::env::temp_dir().join(format!("staycast-lineage-{}", std::process::id()));
        let path = dir.join("model.json");
        model.save(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(json["lineage"]["seasons"], "012");
        assert_eq!(json["lineage"]["vocabularies"]["room_type"][1], "Private room");

        let loaded = LinearModel::load(&path, &NAMES).unwrap();
        assert_eq!(loaded.lineage(), Some(&lineage));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_fit_checks_width() {
        let mut model =
            LinearModel::new(&NAMES, SgdConfig::default(), TargetTransform::Log1p).unwrap();
        assert!(matches!(
            model.fit(&Array2::zeros((2, 3)), &Array1::zeros(2)),
            Err(ModelError::DimensionMismatch(_))
        ));
    }
}
