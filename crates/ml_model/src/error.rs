//! Error type for fitting, evaluating and persisting models.

use std::path::PathBuf;

use feature_extractor::FeatureSet;
use insurance_structs::{HyperParameterError, HyperParameters};
use thiserror::Error;

/// Errors raised by this crate.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot fit on an empty dataset")]
    EmptyDataset,

    #[error("{rows} feature rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("row {row} has {found} features, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("non-finite {column} value at row {row}")]
    NonFinite { column: &'static str, row: usize },

    #[error("invalid hyperparameters: {0}")]
    HyperParameters(#[from] HyperParameterError),

    #[error("expected {expected} features, got {found}")]
    FeatureWidth { expected: usize, found: usize },

    #[error("data was encoded with the {found} feature set, model expects {expected}")]
    FeatureSetMismatch {
        expected: FeatureSet,
        found: FeatureSet,
    },

    #[error("test ratio must be strictly between 0 and 1, got {0}")]
    InvalidTestRatio(f64),

    #[error("{rows} rows cannot be split into non-empty train and test partitions")]
    SplitTooSmall { rows: usize },

    #[error("the {0} range of the sweep grid is empty")]
    EmptyRange(&'static str),

    #[error("fit failed for {params:?}: {source}")]
    Sweep {
        params: HyperParameters,
        source: Box<ModelError>,
    },

    #[error("corrupt checkpoint: {0}")]
    CorruptCheckpoint(String),

    #[error("failed to access checkpoint {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to (de)serialize checkpoint: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
