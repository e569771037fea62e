//! Regression metrics.

use ndarray::Array1;

/// Root mean squared error. `None` for empty or mismatched inputs.
pub fn rmse(actual: &Array1<f64>, predicted: &Array1<f64>) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let diff = actual - predicted;
    Some((diff.dot(&diff) / actual.len() as f64).sqrt())
}

/// Coefficient of determination.
///
/// A constant target gives 1 for a perfect fit and 0 otherwise.
pub fn r2(actual: &Array1<f64>, predicted: &Array1<f64>) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let mean = actual.mean()?;
    let diff = actual - predicted;
    let ss_res = diff.dot(&diff);
    let ss_tot = actual.mapv(|v| (v - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Some(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Some(1.0 - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_perfect_fit() {
        let y = array![1.0, 2.0, 3.0];
        assert_relative_eq!(rmse(&y, &y).unwrap(), 0.0);
        assert_relative_eq!(r2(&y, &y).unwrap(), 1.0);
    }

    #[test]
    fn test_known_values() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        let p = array![2.0, 2.0, 3.0, 3.0];
        assert_relative_eq!(rmse(&y, &p).unwrap(), (0.5f64).sqrt());
        // ss_res = 2, ss_tot = 5
        assert_relative_eq!(r2(&y, &p).unwrap(), 0.6);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(rmse(&array![], &array![]).is_none());
        assert!(r2(&array![1.0], &array![1.0, 2.0]).is_none());
        assert_relative_eq!(r2(&array![5.0, 5.0], &array![4.0, 6.0]).unwrap(), 0.0);
    }
}
