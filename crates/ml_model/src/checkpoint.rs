//! JSON model checkpoints.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::{GradientBoostingRegressor, ModelError, Result};

/// Writes `model` to `path` as pretty-printed JSON, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_checkpoint(model: &GradientBoostingRegressor, path: &Path) -> Result<()> {
    let io_err = |source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(model)?;
    fs::write(path, json).map_err(io_err)?;

    info!(path = %path.display(), trees = model.trees().len(), "Saved model checkpoint");
    Ok(())
}

/// Reads and validates a checkpoint written by [`save_checkpoint`].
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a model, or fails
/// [`GradientBoostingRegressor::validate`].
pub fn load_checkpoint(path: &Path) -> Result<GradientBoostingRegressor> {
    let json = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let model: GradientBoostingRegressor = serde_json::from_str(&json)?;
    model.validate()?;

    info!(
        path = %path.display(),
        feature_set = %model.feature_set(),
        trees = model.trees().len(),
        "Loaded model checkpoint"
    );
    Ok(model)
}
