//! Sweep command - scores every hyperparameter combination and writes the
//! results file.

use std::path::Path;

use anyhow::{Context, Result};
use config::Config;
use feature_extractor::FeatureSet;
use ml_model::{ModelConfig, SplitConfig, SweepGrid, run_sweep};
use results_store::{ResultCollection, save_results};
use tracing::info;

use super::load_training_data;

/// Runs the sweep command.
///
/// # Errors
///
/// Returns an error if the dataset cannot be loaded, any fit fails, or the
/// results cannot be written.
pub fn run(config: &Config, grid: &SweepGrid, output: &Path) -> Result<ResultCollection> {
    let data = load_training_data(&config.dataset_path, FeatureSet::Full)?;
    let split = SplitConfig {
        test_ratio: config.test_ratio,
        seed: config.split_seed,
    };

    let records = run_sweep(&data, grid, &split, &ModelConfig::default())
        .context("Hyperparameter sweep failed")?;
    let collection = ResultCollection::new(records).context("Sweep produced an invalid collection")?;

    save_results(&collection, output)
        .with_context(|| format!("Failed to write results to {}", output.display()))?;

    if let Some(best) = collection.best_by_rmse() {
        info!(
            n_estimators = best.n_estimators,
            learning_rate = best.learning_rate,
            max_depth = best.max_depth,
            rmse = best.rmse,
            r2 = best.r2,
            "Best configuration"
        );
    }

    Ok(collection)
}
