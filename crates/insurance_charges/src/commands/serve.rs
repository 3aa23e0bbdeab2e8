//! Serve command - loads all artifacts and runs the HTTP API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use config::Config;
use ml_model::load_checkpoint;
use performance_api::{AppState, ServerConfig};
use results_store::load_results;
use tracing::info;

use super::load_training_data;

/// Builds the server state. Any missing or corrupt artifact is an error.
///
/// # Errors
///
/// Returns an error if the results file, the model checkpoint or the dataset
/// cannot be loaded.
pub fn build_state(config: &Config) -> Result<AppState> {
    let results = load_results(&config.results_path).with_context(|| {
        format!(
            "Failed to load performance results from {}",
            config.results_path.display()
        )
    })?;
    let model = load_checkpoint(&config.model_path)
        .with_context(|| format!("Failed to load model from {}", config.model_path.display()))?;
    let comparison_data = load_training_data(&config.dataset_path, config.comparison_features)?;

    let state = AppState::new(results, model, comparison_data);
    if config.comparison_cache {
        info!("Comparison cache enabled");
        Ok(state.with_comparison_cache())
    } else {
        Ok(state)
    }
}

/// Runs the serve command.
///
/// # Errors
///
/// Returns an error if startup fails or the server stops with an error.
pub async fn run(config: &Config, bind: Option<SocketAddr>) -> Result<()> {
    let state = build_state(config)?;

    let mut server_config = ServerConfig::default().with_address(bind.unwrap_or(config.bind_address));
    if !config.cors_enabled {
        server_config = server_config.without_cors();
    }

    performance_api::serve(state, server_config)
        .await
        .context("Server failed")?;
    Ok(())
}
