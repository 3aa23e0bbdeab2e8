//! Deterministic train/test splitting.

use feature_extractor::TrainingData;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{ModelError, Result};

/// Default seed of the train/test shuffle.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Default fraction of rows held out for evaluation.
pub const DEFAULT_TEST_RATIO: f64 = 0.2;

/// How rows are divided into train and test partitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Fraction of rows in the test partition, strictly between 0 and 1.
    pub test_ratio: f64,
    /// Seed of the row shuffle.
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: DEFAULT_TEST_RATIO,
            seed: DEFAULT_SPLIT_SEED,
        }
    }
}

/// Shuffles row indices with a seeded PRNG and returns `(train, test)` index
/// lists. The test partition holds `ceil(rows * test_ratio)` rows.
///
/// # Errors
///
/// Returns an error if the ratio is out of range or either partition would be
/// empty.
pub fn split_indices(rows: usize, config: &SplitConfig) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(config.test_ratio > 0.0 && config.test_ratio < 1.0) {
        return Err(ModelError::InvalidTestRatio(config.test_ratio));
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "ratio is in (0, 1) so the product is within [0, rows]"
    )]
    let test_rows = (rows as f64 * config.test_ratio).ceil() as usize;
    if test_rows == 0 || test_rows >= rows {
        return Err(ModelError::SplitTooSmall { rows });
    }

    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(test_rows);
    Ok((train, indices))
}

/// Splits training data into `(train, test)` partitions.
///
/// # Errors
///
/// Returns an error if the data cannot be split, see [`split_indices`].
pub fn train_test_split(
    data: &TrainingData,
    config: &SplitConfig,
) -> Result<(TrainingData, TrainingData)> {
    let (train, test) = split_indices(data.len(), config)?;
    Ok((data.select(&train), data.select(&test)))
}
