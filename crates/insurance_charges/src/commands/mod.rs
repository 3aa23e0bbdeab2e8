//! CLI command implementations.

pub mod predict;
pub mod serve;
pub mod sweep;
pub mod train;

use std::path::Path;

use anyhow::{Context, Result};
use dataset_loader::load_dataset;
use feature_extractor::{FeatureSet, TrainingData};
use tracing::info;

/// Loads the dataset CSV and encodes it with `feature_set`.
fn load_training_data(path: &Path, feature_set: FeatureSet) -> Result<TrainingData> {
    let dataset = load_dataset(path)
        .with_context(|| format!("Failed to load dataset from {}", path.display()))?;
    info!(rows = dataset.len(), %feature_set, "Loaded insurance dataset");
    Ok(TrainingData::from_dataset(&dataset, feature_set))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fmt::Write as _;
    use std::path::Path;

    use config::Config;

    /// Writes a small but varied insurance CSV and returns a config pointing
    /// every artifact into `dir`.
    pub fn setup(dir: &Path) -> Config {
        let sexes = ["female", "male"];
        let smokers = ["no", "yes"];
        let regions = ["northeast", "northwest", "southeast", "southwest"];

        let mut csv = String::from("age,sex,bmi,children,smoker,region,charges\n");
        for i in 0..40_u32 {
            let age = 18 + i;
            let bmi = 20.0 + f64::from(i % 11) * 1.5;
            let smoker = smokers[(i % 5 == 0) as usize];
            let charges = 1500.0
                + 260.0 * f64::from(age)
                + 300.0 * bmi
                + if smoker == "yes" { 20000.0 } else { 0.0 };
            writeln!(
                csv,
                "{age},{},{bmi},{},{smoker},{},{charges}",
                sexes[(i % 2) as usize],
                i % 4,
                regions[(i % 4) as usize],
            )
            .unwrap();
        }

        let dataset_path = dir.join("insurance.csv");
        std::fs::write(&dataset_path, csv).unwrap();

        let mut config = Config::from_lookup(|_| None).unwrap();
        config.dataset_path = dataset_path;
        config.results_path = dir.join("model_performance_data.json");
        config.model_path = dir.join("artifacts").join("model.json");
        config
    }
}
