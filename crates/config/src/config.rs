use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};
use feature_extractor::FeatureSet;
use tracing::debug;

pub const DEFAULT_DATASET_PATH: &str = "data/insurance.csv";
pub const DEFAULT_RESULTS_PATH: &str = "model_performance_data.json";
pub const DEFAULT_MODEL_PATH: &str = "artifacts/model.json";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Insurance CSV used for fitting.
    pub dataset_path: PathBuf,

    /// Results file written by the sweep and served by the API.
    pub results_path: PathBuf,

    /// Model checkpoint written by `train` and loaded by `serve` and `predict`.
    pub model_path: PathBuf,

    /// Address the HTTP server listens on.
    pub bind_address: SocketAddr,

    /// Seed of the train/test shuffle.
    pub split_seed: u64,

    /// Fraction of rows held out for evaluation.
    pub test_ratio: f64,

    /// Attach `Access-Control-Allow-Origin: *` to every response.
    pub cors_enabled: bool,

    /// Feature set used when the prediction endpoint refits on the dataset.
    pub comparison_features: FeatureSet,

    /// Cache refit comparisons for triples present in the results file.
    pub comparison_cache: bool,

    /// Directory for the log file. Logs go to the console only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables, after reading a `.env`
    /// file if one exists.
    ///
    /// Every variable is optional:
    /// - `INSURANCE_DATASET_PATH` (default: `data/insurance.csv`)
    /// - `RESULTS_PATH` (default: `model_performance_data.json`)
    /// - `MODEL_PATH` (default: `artifacts/model.json`)
    /// - `BIND_ADDRESS` (default: `127.0.0.1:5000`)
    /// - `SPLIT_SEED` (default: `42`)
    /// - `TEST_RATIO` (default: `0.2`)
    /// - `CORS_ENABLED` (default: `true`)
    /// - `COMPARISON_FEATURES`: `full` or `numeric` (default: `numeric`)
    /// - `COMPARISON_CACHE` (default: `true`)
    /// - `LOG_DIR` (default: unset)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let path = |key: &str, default: &str| var(key).map_or_else(|| PathBuf::from(default), PathBuf::from);

        let bind_address: SocketAddr = var("BIND_ADDRESS")
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDRESS)
            .trim()
            .parse()
            .context("BIND_ADDRESS must be a socket address such as 127.0.0.1:5000")?;

        let split_seed: u64 = match var("SPLIT_SEED") {
            Some(v) => v.trim().parse().context("SPLIT_SEED must be an unsigned integer")?,
            None => 42,
        };

        let test_ratio: f64 = match var("TEST_RATIO") {
            Some(v) => v.trim().parse().context("TEST_RATIO must be a number")?,
            None => 0.2,
        };
        if !(test_ratio > 0.0 && test_ratio < 1.0) {
            bail!("TEST_RATIO must be strictly between 0 and 1, got {test_ratio}");
        }

        let comparison_features: FeatureSet = match var("COMPARISON_FEATURES") {
            Some(v) => v.parse().context("COMPARISON_FEATURES must be `full` or `numeric`")?,
            None => FeatureSet::Numeric,
        };

        Ok(Self {
            dataset_path: path("INSURANCE_DATASET_PATH", DEFAULT_DATASET_PATH),
            results_path: path("RESULTS_PATH", DEFAULT_RESULTS_PATH),
            model_path: path("MODEL_PATH", DEFAULT_MODEL_PATH),
            bind_address,
            split_seed,
            test_ratio,
            cors_enabled: parse_flag("CORS_ENABLED", var("CORS_ENABLED"), true)?,
            comparison_features,
            comparison_cache: parse_flag("COMPARISON_CACHE", var("COMPARISON_CACHE"), true)?,
            log_dir: var("LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_flag(key: &str, value: Option<String>, default: bool) -> anyhow::Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean, got `{other}`"),
    }
}
