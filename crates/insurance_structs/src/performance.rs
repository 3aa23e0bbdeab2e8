use serde::{Deserialize, Serialize};

use crate::HyperParameters;

/// Regression error metrics computed on held-out data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Root mean squared error.
    pub rmse: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Coefficient of determination. Negative when the model does worse than
    /// predicting the mean.
    pub r2: f64,
}

/// Performance of one hyperparameter combination of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl ResultRecord {
    #[must_use]
    pub const fn new(params: HyperParameters, metrics: RegressionMetrics) -> Self {
        Self {
            n_estimators: params.n_estimators,
            learning_rate: params.learning_rate,
            max_depth: params.max_depth,
            rmse: metrics.rmse,
            mae: metrics.mae,
            r2: metrics.r2,
        }
    }

    #[must_use]
    pub const fn hyperparameters(&self) -> HyperParameters {
        HyperParameters::new(self.n_estimators, self.learning_rate, self.max_depth)
    }

    #[must_use]
    pub const fn metrics(&self) -> RegressionMetrics {
        RegressionMetrics {
            rmse: self.rmse,
            mae: self.mae,
            r2: self.r2,
        }
    }
}

/// Distinct values observed for each hyperparameter, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterRanges {
    pub n_estimators: Vec<usize>,
    pub learning_rates: Vec<f64>,
    pub max_depths: Vec<usize>,
}
