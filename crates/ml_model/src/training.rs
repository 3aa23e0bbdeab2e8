//! Training entry points shared by the sweep and the prediction service.

use feature_extractor::TrainingData;
use insurance_structs::{ComparisonRow, HyperParameters, RegressionMetrics};

use crate::metrics::evaluate;
use crate::{GradientBoostingRegressor, ModelConfig, Result};

/// Fits a model on `train` and scores it on `test`.
///
/// # Errors
///
/// Returns an error if fitting fails or the partitions use different feature
/// sets.
pub fn fit_and_evaluate(
    train: &TrainingData,
    test: &TrainingData,
    params: HyperParameters,
    config: &ModelConfig,
) -> Result<(GradientBoostingRegressor, RegressionMetrics)> {
    let model = GradientBoostingRegressor::fit(train, params, config)?;
    let predicted = model.predict(test)?;
    let metrics = evaluate(test.targets(), &predicted);
    Ok((model, metrics))
}

/// Fits a model on every row of `data` and predicts the same rows.
///
/// Row `i` of the output refers to row `i` of `data`.
///
/// # Errors
///
/// Returns an error if fitting fails.
pub fn in_sample_comparison(
    data: &TrainingData,
    params: HyperParameters,
    config: &ModelConfig,
) -> Result<Vec<ComparisonRow>> {
    let model = GradientBoostingRegressor::fit(data, params, config)?;
    let predicted = model.predict(data)?;

    Ok(data
        .targets()
        .iter()
        .zip(predicted)
        .enumerate()
        .map(|(index, (&actual, predicted))| ComparisonRow {
            index,
            actual,
            predicted,
        })
        .collect())
}
