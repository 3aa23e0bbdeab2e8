//! ML model crate for insurance charges prediction.
//!
//! This crate defines a gradient-boosted regression tree ensemble, the
//! metrics used to score it, deterministic train/test splitting, model
//! checkpoints, and the hyperparameter sweep that produces the performance
//! results served by the API.

use feature_extractor::{FeatureSet, TrainingData};
use insurance_structs::HyperParameters;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod checkpoint;
pub mod dataset;
mod error;
pub mod metrics;
pub mod sweep;
pub mod training;
pub mod tree;

pub use checkpoint::{load_checkpoint, save_checkpoint};
pub use dataset::{SplitConfig, train_test_split};
pub use error::{ModelError, Result};
pub use sweep::{SweepGrid, run_sweep};
pub use training::{fit_and_evaluate, in_sample_comparison};
pub use tree::{RegressionTree, TreeConfig};

/// Tree growth settings that are not swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    /// Minimum number of rows a node needs before it may split.
    pub min_samples_split: usize,
    /// Minimum number of rows on each side of a split.
    pub min_samples_leaf: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Gradient boosting for regression with squared-error loss.
///
/// The ensemble starts from the mean training target. Each stage fits a
/// regression tree to the current residuals and adds its output scaled by
/// the learning rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    feature_set: FeatureSet,
    hyperparameters: HyperParameters,
    initial_prediction: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    /// Fits a new ensemble.
    ///
    /// # Errors
    ///
    /// Returns an error if the hyperparameters are invalid, the data is empty
    /// or inconsistent, or it contains non-finite values.
    pub fn fit(
        data: &TrainingData,
        params: HyperParameters,
        config: &ModelConfig,
    ) -> Result<Self> {
        params.validate()?;
        validate_data(data)?;

        let features = data.features();
        let targets = data.targets();
        let initial_prediction = targets.iter().sum::<f64>() / targets.len() as f64;

        let tree_config = TreeConfig {
            max_depth: params.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };

        let mut predictions = vec![initial_prediction; targets.len()];
        let mut trees = Vec::new();

        for _ in 0..params.n_estimators {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(&predictions)
                .map(|(y, p)| y - p)
                .collect();

            let tree = RegressionTree::fit(features, &residuals, &tree_config);
            for (prediction, row) in predictions.iter_mut().zip(features) {
                *prediction += params.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        debug!(
            n_estimators = params.n_estimators,
            learning_rate = params.learning_rate,
            max_depth = params.max_depth,
            rows = targets.len(),
            "Fitted gradient boosting model"
        );

        Ok(Self {
            feature_set: data.feature_set(),
            hyperparameters: params,
            initial_prediction,
            trees,
        })
    }

    /// Predicts a single encoded row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row width does not match the feature set the
    /// model was trained on.
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        let expected = self.feature_set.width();
        if row.len() != expected {
            return Err(ModelError::FeatureWidth {
                expected,
                found: row.len(),
            });
        }

        Ok(self.trees.iter().fold(self.initial_prediction, |acc, tree| {
            acc + self.hyperparameters.learning_rate * tree.predict_row(row)
        }))
    }

    /// Predicts every row of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` was encoded with a different feature set.
    pub fn predict(&self, data: &TrainingData) -> Result<Vec<f64>> {
        if data.feature_set() != self.feature_set {
            return Err(ModelError::FeatureSetMismatch {
                expected: self.feature_set,
                found: data.feature_set(),
            });
        }
        data.features()
            .iter()
            .map(|row| self.predict_row(row))
            .collect()
    }

    #[must_use]
    pub const fn feature_set(&self) -> FeatureSet {
        self.feature_set
    }

    #[must_use]
    pub const fn hyperparameters(&self) -> HyperParameters {
        self.hyperparameters
    }

    #[must_use]
    pub const fn initial_prediction(&self) -> f64 {
        self.initial_prediction
    }

    #[must_use]
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Checks the internal consistency of a deserialized model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CorruptCheckpoint`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        self.hyperparameters.validate()?;
        if !self.initial_prediction.is_finite() {
            return Err(ModelError::CorruptCheckpoint(
                "initial prediction is not finite".to_string(),
            ));
        }
        if self.trees.len() != self.hyperparameters.n_estimators {
            return Err(ModelError::CorruptCheckpoint(format!(
                "{} trees stored for n_estimators = {}",
                self.trees.len(),
                self.hyperparameters.n_estimators
            )));
        }
        let width = self.feature_set.width();
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(width)
                .map_err(|reason| ModelError::CorruptCheckpoint(format!("tree {i}: {reason}")))?;
        }
        Ok(())
    }
}

fn validate_data(data: &TrainingData) -> Result<()> {
    let features = data.features();
    let targets = data.targets();

    if features.len() != targets.len() {
        return Err(ModelError::LengthMismatch {
            rows: features.len(),
            targets: targets.len(),
        });
    }
    if targets.is_empty() {
        return Err(ModelError::EmptyDataset);
    }

    let expected = data.feature_set().width();
    for (row, (values, target)) in features.iter().zip(targets).enumerate() {
        if values.len() != expected {
            return Err(ModelError::RaggedRow {
                row,
                found: values.len(),
                expected,
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite {
                column: "feature",
                row,
            });
        }
        if !target.is_finite() {
            return Err(ModelError::NonFinite {
                column: "target",
                row,
            });
        }
    }
    Ok(())
}
