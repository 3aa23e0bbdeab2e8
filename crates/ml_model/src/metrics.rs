//! Regression error metrics.
//!
//! All functions pair `actual` and `predicted` element-wise; the slices must
//! have the same length. Empty input yields zero errors.

use insurance_structs::RegressionMetrics;

/// Root mean squared error.
#[must_use]
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len(), "metric inputs differ in length");
    let n = actual.len();
    if n == 0 {
        return 0.0;
    }
    let sse: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    (sse / n as f64).sqrt()
}

/// Mean absolute error.
#[must_use]
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len(), "metric inputs differ in length");
    let n = actual.len();
    if n == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n as f64
}

/// Coefficient of determination.
///
/// When `actual` is constant the score is 1.0 for a perfect prediction and 0.0
/// otherwise.
#[must_use]
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len(), "metric inputs differ in length");
    let n = actual.len();
    if n == 0 {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / n as f64;

    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Computes RMSE, MAE and R² in one call.
#[must_use]
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> RegressionMetrics {
    RegressionMetrics {
        rmse: root_mean_squared_error(actual, predicted),
        mae: mean_absolute_error(actual, predicted),
        r2: r2_score(actual, predicted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_perfect_prediction() {
        let y = [1.0, 2.0, 3.0];
        let metrics = evaluate(&y, &y);
        assert!(metrics.rmse.abs() < EPS);
        assert!(metrics.mae.abs() < EPS);
        assert!((metrics.r2 - 1.0).abs() < EPS);
    }

    #[test]
    fn test_known_values() {
        let actual = [3.0, -0.5, 2.0, 7.0];
        let predicted = [2.5, 0.0, 2.0, 8.0];

        assert!((mean_absolute_error(&actual, &predicted) - 0.5).abs() < EPS);
        assert!((root_mean_squared_error(&actual, &predicted) - 0.375_f64.sqrt()).abs() < EPS);
        assert!((r2_score(&actual, &predicted) - 0.948_608_137_044_967_9).abs() < 1e-9);
    }

    #[test]
    fn test_r2_negative_for_bad_model() {
        let actual = [1.0, 2.0, 3.0];
        let predicted = [3.0, 2.0, 1.0];
        assert!(r2_score(&actual, &predicted) < 0.0);
    }

    #[test]
    fn test_constant_targets() {
        assert!((r2_score(&[4.0, 4.0], &[4.0, 4.0]) - 1.0).abs() < EPS);
        assert!(r2_score(&[4.0, 4.0], &[4.0, 5.0]).abs() < EPS);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "metric inputs differ in length")]
    fn test_length_mismatch_panics_in_debug() {
        let _ = root_mean_squared_error(&[1.0, 2.0], &[1.0]);
    }

    #[test]
    fn test_empty_input() {
        let metrics = evaluate(&[], &[]);
        assert!(metrics.rmse.abs() < EPS);
        assert!(metrics.mae.abs() < EPS);
    }
}
