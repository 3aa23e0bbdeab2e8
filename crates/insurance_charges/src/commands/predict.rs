//! Predict command - one-off prediction against the saved checkpoint.

use std::path::Path;

use anyhow::{Context, Result};
use feature_extractor::encode_request;
use insurance_structs::PredictionRequest;
use ml_model::load_checkpoint;
use tracing::info;

/// Runs the predict command and returns the predicted charges.
///
/// # Errors
///
/// Returns an error if the model cannot be loaded or the request does not fit
/// the model's feature set.
pub fn run(request: &PredictionRequest, model_path: &Path) -> Result<f64> {
    let model = load_checkpoint(model_path)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;

    let features = encode_request(request, model.feature_set()).context("Invalid prediction input")?;
    let prediction = model.predict_row(&features)?;

    info!("Predicted charges: {prediction:.2}");
    Ok(prediction)
}
