use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Names of the swept hyperparameters, as used in query strings and JSON.
pub const HYPERPARAMETER_FIELDS: [&str; 3] = ["n_estimators", "learning_rate", "max_depth"];

/// Largest accepted number of boosting stages.
pub const MAX_N_ESTIMATORS: usize = 10_000;

/// Largest accepted tree depth.
pub const MAX_DEPTH: usize = 32;

/// Error returned by [`HyperParameters::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HyperParameterError {
    #[error("n_estimators must be at least 1")]
    ZeroEstimators,

    #[error("max_depth must be at least 1")]
    ZeroDepth,

    #[error("n_estimators must be at most {MAX_N_ESTIMATORS}, got {0}")]
    TooManyEstimators(usize),

    #[error("max_depth must be at most {MAX_DEPTH}, got {0}")]
    DepthTooLarge(usize),

    #[error("learning_rate must be a finite positive number, got {0}")]
    InvalidLearningRate(f64),
}

/// The swept configuration of the boosting algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperParameters {
    /// Number of boosting stages.
    pub n_estimators: usize,
    /// Shrinkage applied to each tree's contribution.
    pub learning_rate: f64,
    /// Maximum depth of each regression tree.
    pub max_depth: usize,
}

impl HyperParameters {
    #[must_use]
    pub const fn new(n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth,
        }
    }

    /// Checks that the triple describes a fittable model.
    ///
    /// # Errors
    ///
    /// Returns an error if a count is zero or above its maximum, or the
    /// learning rate is not a finite positive number.
    pub fn validate(&self) -> Result<(), HyperParameterError> {
        if self.n_estimators == 0 {
            return Err(HyperParameterError::ZeroEstimators);
        }
        if self.n_estimators > MAX_N_ESTIMATORS {
            return Err(HyperParameterError::TooManyEstimators(self.n_estimators));
        }
        if self.max_depth == 0 {
            return Err(HyperParameterError::ZeroDepth);
        }
        if self.max_depth > MAX_DEPTH {
            return Err(HyperParameterError::DepthTooLarge(self.max_depth));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(HyperParameterError::InvalidLearningRate(self.learning_rate));
        }
        Ok(())
    }

    /// Returns a hashable identity for this triple.
    #[must_use]
    pub const fn key(&self) -> HyperParameterKey {
        HyperParameterKey {
            n_estimators: self.n_estimators,
            learning_rate_bits: self.learning_rate.to_bits(),
            max_depth: self.max_depth,
        }
    }
}

/// Exact identity of a [`HyperParameters`] triple.
///
/// The learning rate is compared by bit pattern, which is the same notion of
/// equality the exact-match filter uses for finite values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HyperParameterKey {
    n_estimators: usize,
    learning_rate_bits: u64,
    max_depth: usize,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_validate() {
        assert!(HyperParameters::new(100, 0.1, 3).validate().is_ok());
        assert_eq!(
            HyperParameters::new(0, 0.1, 3).validate(),
            Err(HyperParameterError::ZeroEstimators)
        );
        assert_eq!(
            HyperParameters::new(10, 0.1, 0).validate(),
            Err(HyperParameterError::ZeroDepth)
        );
        assert!(HyperParameters::new(MAX_N_ESTIMATORS, 0.1, MAX_DEPTH).validate().is_ok());
        assert_eq!(
            HyperParameters::new(1_000_000_000_000, 0.1, 2).validate(),
            Err(HyperParameterError::TooManyEstimators(1_000_000_000_000))
        );
        assert_eq!(
            HyperParameters::new(10, 0.1, 1_000).validate(),
            Err(HyperParameterError::DepthTooLarge(1_000))
        );
        assert!(HyperParameters::new(10, 0.0, 2).validate().is_err());
        assert!(HyperParameters::new(10, f64::NAN, 2).validate().is_err());
        assert!(HyperParameters::new(10, -0.5, 2).validate().is_err());
    }

    #[test]
    fn test_key_distinguishes_triples() {
        let keys: HashSet<_> = [
            HyperParameters::new(50, 0.01, 2),
            HyperParameters::new(50, 0.05, 2),
            HyperParameters::new(50, 0.01, 3),
            HyperParameters::new(50, 0.01, 2),
        ]
        .iter()
        .map(HyperParameters::key)
        .collect();

        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_deserialize_from_request_body() {
        let params: HyperParameters =
            serde_json::from_str(r#"{"n_estimators": 100, "learning_rate": 0.05, "max_depth": 3}"#)
                .unwrap();
        assert_eq!(params, HyperParameters::new(100, 0.05, 3));

        let missing = serde_json::from_str::<HyperParameters>(r#"{"n_estimators": 100}"#);
        assert!(missing.unwrap_err().to_string().contains("learning_rate"));
    }
}
