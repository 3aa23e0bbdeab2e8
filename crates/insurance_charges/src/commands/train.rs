//! Train command - fits the model used for single predictions.

use std::path::Path;

use anyhow::{Context, Result};
use config::Config;
use feature_extractor::FeatureSet;
use insurance_structs::{HyperParameters, RegressionMetrics};
use ml_model::{ModelConfig, SplitConfig, fit_and_evaluate, save_checkpoint, train_test_split};
use tracing::info;

use super::load_training_data;

/// Runs the train command.
///
/// Fits on the training partition, reports held-out metrics and saves the
/// checkpoint to `output`.
///
/// # Errors
///
/// Returns an error if the dataset cannot be loaded, fitting fails, or the
/// checkpoint cannot be written.
pub fn run(
    config: &Config,
    params: HyperParameters,
    feature_set: FeatureSet,
    output: &Path,
) -> Result<RegressionMetrics> {
    info!(
        n_estimators = params.n_estimators,
        learning_rate = params.learning_rate,
        max_depth = params.max_depth,
        %feature_set,
        "Starting training"
    );

    let data = load_training_data(&config.dataset_path, feature_set)?;
    let split = SplitConfig {
        test_ratio: config.test_ratio,
        seed: config.split_seed,
    };
    let (train, test) = train_test_split(&data, &split).context("Failed to split dataset")?;

    let (model, metrics) = fit_and_evaluate(&train, &test, params, &ModelConfig::default())
        .context("Training failed")?;

    info!(
        rmse = metrics.rmse,
        mae = metrics.mae,
        r2 = metrics.r2,
        test_rows = test.len(),
        "Held-out metrics"
    );

    save_checkpoint(&model, output)
        .with_context(|| format!("Failed to save model to {}", output.display()))?;

    Ok(metrics)
}
