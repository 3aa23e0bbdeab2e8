//! Insurance charges model
//!
//! Sweeps, trains and serves a gradient-boosted regression model for medical
//! insurance charges.

use std::fs::{self, File};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use feature_extractor::FeatureSet;
use insurance_charges::commands;
use insurance_structs::{HyperParameters, PredictionRequest, Region, Sex, Smoker};
use ml_model::SweepGrid;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, fmt};

/// Insurance charges model
#[derive(Parser)]
#[command(name = "insurance-charges")]
#[command(about = "Gradient-boosted insurance charges model: sweep, train and serve")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every hyperparameter combination and write the results file
    Sweep {
        /// Values of `n_estimators` to try
        #[arg(long, value_delimiter = ',', default_values_t = [50, 100, 200])]
        n_estimators: Vec<usize>,

        /// Learning rates to try
        #[arg(long, value_delimiter = ',', default_values_t = [0.01, 0.05, 0.1])]
        learning_rates: Vec<f64>,

        /// Tree depths to try
        #[arg(long, value_delimiter = ',', default_values_t = [2, 3, 5])]
        max_depths: Vec<usize>,

        /// Results file (defaults to `RESULTS_PATH`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit the model used for single predictions and save it
    Train {
        /// Number of boosting stages
        #[arg(long, default_value = "100")]
        n_estimators: usize,

        /// Shrinkage of each stage
        #[arg(long, default_value = "0.1")]
        learning_rate: f64,

        /// Maximum tree depth
        #[arg(long, default_value = "3")]
        max_depth: usize,

        /// Feature set: `full` or `numeric`
        #[arg(long, default_value = "full")]
        features: FeatureSet,

        /// Checkpoint path (defaults to `MODEL_PATH`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the performance and prediction API
    Serve {
        /// Listen address (defaults to `BIND_ADDRESS`)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Predict charges for one person with the saved model
    Predict {
        #[arg(long)]
        age: f64,

        #[arg(long)]
        bmi: f64,

        #[arg(long, default_value = "0")]
        children: f64,

        /// `female` or `male`
        #[arg(long)]
        sex: Sex,

        /// `yes` or `no`
        #[arg(long)]
        smoker: Smoker,

        /// Required by models trained on the full feature set
        #[arg(long)]
        region: Option<Region>,

        /// Checkpoint path (defaults to `MODEL_PATH`)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(cli.verbose, &config)?;

    match cli.command {
        Commands::Sweep {
            n_estimators,
            learning_rates,
            max_depths,
            output,
        } => {
            let grid = SweepGrid {
                n_estimators,
                learning_rates,
                max_depths,
            };
            let output = output.unwrap_or_else(|| config.results_path.clone());
            let collection = commands::sweep::run(&config, &grid, &output)?;
            info!(records = collection.len(), path = %output.display(), "Sweep complete");
        }
        Commands::Train {
            n_estimators,
            learning_rate,
            max_depth,
            features,
            output,
        } => {
            let params = HyperParameters::new(n_estimators, learning_rate, max_depth);
            let output = output.unwrap_or_else(|| config.model_path.clone());
            commands::train::run(&config, params, features, &output)?;
        }
        Commands::Serve { bind } => {
            commands::serve::run(&config, bind).await?;
        }
        Commands::Predict {
            age,
            bmi,
            children,
            sex,
            smoker,
            region,
            model,
        } => {
            let request = PredictionRequest {
                age,
                bmi,
                children,
                sex,
                smoker,
                region,
            };
            let model = model.unwrap_or_else(|| config.model_path.clone());
            let prediction = commands::predict::run(&request, &model)?;
            println!("{prediction:.2}");
        }
    }

    Ok(())
}

/// Console logging, plus a log file when `LOG_DIR` is set. `RUST_LOG`
/// overrides the default filter.
fn init_tracing(verbose: bool, config: &Config) -> Result<()> {
    let default_filter = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stdout);

    let file_layer = match &config.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let path = dir.join("insurance-charges.log");
            let log_file = File::create(&path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(log_file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
