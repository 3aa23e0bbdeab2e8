//! Hyperparameter grid sweep.

use std::collections::HashSet;

use feature_extractor::TrainingData;
use insurance_structs::{HyperParameters, ResultRecord};
use tracing::info;

use crate::dataset::{SplitConfig, train_test_split};
use crate::training::fit_and_evaluate;
use crate::{ModelConfig, ModelError, Result};

/// The hyperparameter values to combine.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub n_estimators: Vec<usize>,
    pub learning_rates: Vec<f64>,
    pub max_depths: Vec<usize>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![50, 100, 200],
            learning_rates: vec![0.01, 0.05, 0.1],
            max_depths: vec![2, 3, 5],
        }
    }
}

impl SweepGrid {
    /// Returns every combination in sweep order: `n_estimators` outermost,
    /// then learning rate, then depth. Repeated values are visited once.
    ///
    /// # Errors
    ///
    /// Returns an error if a range is empty or a combination is invalid.
    pub fn combinations(&self) -> Result<Vec<HyperParameters>> {
        let n_estimators = dedup(&self.n_estimators, |v| *v);
        let learning_rates = dedup(&self.learning_rates, |v| v.to_bits());
        let max_depths = dedup(&self.max_depths, |v| *v);

        if n_estimators.is_empty() {
            return Err(ModelError::EmptyRange("n_estimators"));
        }
        if learning_rates.is_empty() {
            return Err(ModelError::EmptyRange("learning_rate"));
        }
        if max_depths.is_empty() {
            return Err(ModelError::EmptyRange("max_depth"));
        }

        let mut combinations =
            Vec::with_capacity(n_estimators.len() * learning_rates.len() * max_depths.len());
        for &n in &n_estimators {
            for &lr in &learning_rates {
                for &depth in &max_depths {
                    let params = HyperParameters::new(n, lr, depth);
                    params.validate()?;
                    combinations.push(params);
                }
            }
        }
        Ok(combinations)
    }
}

fn dedup<T: Copy, K: Eq + std::hash::Hash>(values: &[T], key: impl Fn(&T) -> K) -> Vec<T> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|v| seen.insert(key(v)))
        .copied()
        .collect()
}

/// Fits and scores one model per grid combination.
///
/// Every combination uses the same train/test partition. Records are returned
/// in the order of [`SweepGrid::combinations`].
///
/// # Errors
///
/// Returns an error if the grid is invalid, the data cannot be split, or any
/// fit fails. A failed fit aborts the whole sweep.
pub fn run_sweep(
    data: &TrainingData,
    grid: &SweepGrid,
    split: &SplitConfig,
    config: &ModelConfig,
) -> Result<Vec<ResultRecord>> {
    let combinations = grid.combinations()?;
    let (train, test) = train_test_split(data, split)?;

    info!(
        combinations = combinations.len(),
        train_rows = train.len(),
        test_rows = test.len(),
        "Starting hyperparameter sweep"
    );

    let total = combinations.len();
    let mut records = Vec::with_capacity(total);
    for (i, params) in combinations.into_iter().enumerate() {
        let (_, metrics) = fit_and_evaluate(&train, &test, params, config).map_err(|e| {
            ModelError::Sweep {
                params,
                source: Box::new(e),
            }
        })?;

        info!(
            "[{}/{}] n_estimators={} learning_rate={} max_depth={} rmse={:.2} mae={:.2} r2={:.4}",
            i + 1,
            total,
            params.n_estimators,
            params.learning_rate,
            params.max_depth,
            metrics.rmse,
            metrics.mae,
            metrics.r2
        );
        records.push(ResultRecord::new(params, metrics));
    }

    Ok(records)
}
