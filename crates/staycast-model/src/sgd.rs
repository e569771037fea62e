//! SGD Linear Regression
//!
//! Plain stochastic gradient descent on squared loss with an L2 penalty.
//! The learning rate decays as
//!
//! ```text
//! eta(t) = eta0 / t^power_t
//! ```
//!
//! where `t` counts samples seen across epochs, starting at 1. Samples are
//! visited in a freshly shuffled order each epoch, drawn from a seeded RNG,
//! so identical inputs and seed give identical coefficients.
//!
//! Training stops after `max_iter` epochs, or earlier once the mean epoch
//! loss has failed to improve on the best seen by at least `tol` for
//! `n_iter_no_change` consecutive epochs.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for [`SgdRegressor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgdConfig {
    /// Maximum number of passes over the data
    pub max_iter: usize,
    /// Initial learning rate
    pub eta0: f64,
    /// Exponent of the inverse scaling schedule
    pub power_t: f64,
    /// L2 penalty strength
    pub alpha: f64,
    /// Minimum improvement of the epoch loss. `None` disables early stopping.
    pub tol: Option<f64>,
    /// Epochs without improvement before stopping
    pub n_iter_no_change: usize,
    /// Shuffle seed
    pub seed: u64,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            eta0: 0.01,
            power_t: 0.25,
            alpha: 1e-4,
            tol: Some(1e-3),
            n_iter_no_change: 5,
            seed: 42,
        }
    }
}

/// Fitted coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct SgdFit {
    /// One weight per feature
    pub coef: Array1<f64>,
    /// Bias term
    pub intercept: f64,
    /// Epochs run
    pub epochs: usize,
    /// Whether the tolerance criterion stopped training
    pub converged: bool,
}

/// Stochastic gradient descent regressor.
#[derive(Debug, Clone)]
pub struct SgdRegressor {
    config: SgdConfig,
}

impl SgdRegressor {
    /// Create a regressor after validating the configuration.
    pub fn new(config: SgdConfig) -> Result<Self> {
        if config.max_iter == 0 {
            return Err(ModelError::InvalidParameter(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if !(config.eta0 > 0.0 && config.eta0.is_finite()) {
            return Err(ModelError::InvalidParameter(format!(
                "eta0 must be positive, got {}",
                config.eta0
            )));
        }
        if !(config.power_t >= 0.0 && config.power_t.is_finite()) {
            return Err(ModelError::InvalidParameter(format!(
                "power_t must be non-negative, got {}",
                config.power_t
            )));
        }
        if !(config.alpha >= 0.0 && config.alpha.is_finite()) {
            return Err(ModelError::InvalidParameter(format!(
                "alpha must be non-negative, got {}",
                config.alpha
            )));
        }
        if config.tol.is_some_and(|tol| !tol.is_finite()) {
            return Err(ModelError::InvalidParameter("tol must be finite".to_string()));
        }
        if config.n_iter_no_change == 0 {
            return Err(ModelError::InvalidParameter(
                "n_iter_no_change must be at least 1".to_string(),
            ));
        }

        Ok(Self { config })
    }

    /// Create with default configuration.
    pub fn try_default() -> Result<Self> {
        Self::new(SgdConfig::default())
    }

    /// Get configuration.
    pub const fn config(&self) -> &SgdConfig {
        &self.config
    }

    /// Fit weights to `x` and `y`.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SgdFit> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(ModelError::EmptyData("no training rows".to_string()));
        }
        if y.len() != n_samples {
            return Err(ModelError::DimensionMismatch(format!(
                "{n_samples} rows but {} targets",
                y.len()
            )));
        }

        let cfg = &self.config;
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let mut order: Vec<usize> = (0..n_samples).collect();

        let mut coef = Array1::<f64>::zeros(n_features);
        let mut intercept = 0.0;
        let mut t = 1.0_f64;

        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0usize;
        let mut epochs = 0usize;
        let mut converged = false;

        for epoch in 0..cfg.max_iter {
            order.shuffle(&mut rng);
            let mut sum_loss = 0.0;

            for &i in &order {
                let row = x.row(i);
                let residual = row.dot(&coef) + intercept - y[i];
                sum_loss += 0.5 * residual * residual;

                let eta = cfg.eta0 / t.powf(cfg.power_t);
                if cfg.alpha > 0.0 {
                    coef *= 1.0 - eta * cfg.alpha;
                }
                coef.scaled_add(-eta * residual, &row);
                intercept -= eta * residual;
                t += 1.0;
            }

            epochs = epoch + 1;
            let epoch_loss = sum_loss / n_samples as f64;
            if !epoch_loss.is_finite() {
                return Err(ModelError::NonFinite(format!(
                    "training loss diverged at epoch {epochs}"
                )));
            }

            if let Some(tol) = cfg.tol {
                if epoch_loss > best_loss - tol {
                    no_improvement += 1;
                } else {
                    no_improvement = 0;
                }
                best_loss = best_loss.min(epoch_loss);

                if no_improvement >= cfg.n_iter_no_change {
                    converged = true;
                    break;
                }
            }
        }

        if converged {
            debug!(epochs, best_loss, "SGD converged");
        } else {
            warn!(epochs, "SGD reached max_iter before convergence");
        }

        Ok(SgdFit {
            coef,
            intercept,
            epochs,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn line_data() -> (Array2<f64>, Array1<f64>) {
        // y = 3 x0 - 2 x1 + 1, features already roughly unit scale
        let n = 200;
        let mut x = Array2::zeros((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let a = (i as f64 / n as f64) * 2.0 - 1.0;
            let b = ((i * 7 % n) as f64 / n as f64) * 2.0 - 1.0;
            x[[i, 0]] = a;
            x[[i, 1]] = b;
            y[i] = 3.0 * a - 2.0 * b + 1.0;
        }
        (x, y)
    }

    #[test]
    fn test_recovers_line() {
        let (x, y) = line_data();
        let config = SgdConfig {
            alpha: 0.0,
            tol: None,
            max_iter: 200,
            ..SgdConfig::default()
        };
        let fit = SgdRegressor::new(config).unwrap().fit(&x, &y).unwrap();

        assert_relative_eq!(fit.coef[0], 3.0, epsilon = 1e-2);
        assert_relative_eq!(fit.coef[1], -2.0, epsilon = 1e-2);
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-2);
        assert_eq!(fit.epochs, 200);
        assert!(!fit.converged);
    }

    #[test]
    fn test_seeded_determinism() {
        let (x, y) = line_data();
        let regressor = SgdRegressor::try_default().unwrap();
        let a = regressor.fit(&x, &y).unwrap();
        let b = regressor.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_early_stopping() {
        let (x, y) = line_data();
        let fit = SgdRegressor::try_default().unwrap().fit(&x, &y).unwrap();
        assert!(fit.converged);
        assert!(fit.epochs < 2000);
    }

    #[rstest]
    #[case(SgdConfig { max_iter: 0, ..SgdConfig::default() })]
    #[case(SgdConfig { eta0: 0.0, ..SgdConfig::default() })]
    #[case(SgdConfig { power_t: -1.0, ..SgdConfig::default() })]
    #[case(SgdConfig { alpha: f64::NAN, ..SgdConfig::default() })]
    #[case(SgdConfig { n_iter_no_change: 0, ..SgdConfig::default() })]
    fn test_invalid_config(#[case] config: SgdConfig) {
        assert!(matches!(
            SgdRegressor::new(config),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_shape_checks() {
        let regressor = SgdRegressor::try_default().unwrap();
        assert!(regressor.fit(&Array2::zeros((0, 2)), &Array1::zeros(0)).is_err());
        assert!(matches!(
            regressor.fit(&Array2::zeros((3, 2)), &Array1::zeros(2)),
            Err(ModelError::DimensionMismatch(_))
        ));
    }
}
