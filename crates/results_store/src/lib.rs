//! Flat-file storage and querying of hyperparameter sweep results.
//!
//! The results file is a JSON array of [`ResultRecord`]s in sweep order. Once
//! loaded, a [`ResultCollection`] is read-only.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use insurance_structs::{HyperParameters, ParameterRanges, ResultRecord};
use thiserror::Error;
use tracing::info;

mod filter;

pub use filter::PerformanceFilter;

/// Errors raised while reading, writing or building a collection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access results file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("results file is not a valid JSON array of records: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate result for {0:?}")]
    DuplicateTriple(HyperParameters),

    #[error("invalid record at position {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// The ordered output of a sweep. Each hyperparameter triple appears once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultCollection {
    records: Vec<ResultRecord>,
}

impl ResultCollection {
    /// Builds a collection, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if a record is invalid or a triple repeats.
    pub fn new(records: Vec<ResultRecord>) -> Result<Self, StoreError> {
        let mut seen = HashSet::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            validate_record(record).map_err(|reason| StoreError::InvalidRecord { index, reason })?;
            let params = record.hyperparameters();
            if !seen.insert(params.key()) {
                return Err(StoreError::DuplicateTriple(params));
            }
        }
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records matching every field set in `filter`, in
    /// collection order.
    #[must_use]
    pub fn filter(&self, filter: &PerformanceFilter) -> Vec<ResultRecord> {
        if filter.is_empty() {
            return self.records.clone();
        }
        self.records
            .iter()
            .filter(|record| filter.matches(record))
            .copied()
            .collect()
    }

    /// Returns the distinct values of each hyperparameter, sorted ascending.
    #[must_use]
    pub fn parameter_ranges(&self) -> ParameterRanges {
        let mut n_estimators: Vec<usize> = self.records.iter().map(|r| r.n_estimators).collect();
        let mut learning_rates: Vec<f64> = self.records.iter().map(|r| r.learning_rate).collect();
        let mut max_depths: Vec<usize> = self.records.iter().map(|r| r.max_depth).collect();

        n_estimators.sort_unstable();
        n_estimators.dedup();
        learning_rates.sort_by(f64::total_cmp);
        learning_rates.dedup_by(|a, b| a.to_bits() == b.to_bits());
        max_depths.sort_unstable();
        max_depths.dedup();

        ParameterRanges {
            n_estimators,
            learning_rates,
            max_depths,
        }
    }

    /// Returns the record with the lowest RMSE, the first one on ties.
    #[must_use]
    pub fn best_by_rmse(&self) -> Option<&ResultRecord> {
        self.records.iter().reduce(|best, record| {
            if record.rmse < best.rmse { record } else { best }
        })
    }
}

fn validate_record(record: &ResultRecord) -> Result<(), String> {
    record
        .hyperparameters()
        .validate()
        .map_err(|e| e.to_string())?;

    for (name, value) in [("rmse", record.rmse), ("mae", record.mae)] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be a finite non-negative number, got {value}"));
        }
    }
    if record.r2.is_nan() || record.r2 > 1.0 {
        return Err(format!("r2 must be at most 1.0, got {}", record.r2));
    }
    Ok(())
}

/// Loads a results file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a valid
/// collection.
pub fn load_results(path: &Path) -> Result<ResultCollection, StoreError> {
    let json = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<ResultRecord> = serde_json::from_str(&json)?;
    let collection = ResultCollection::new(records)?;

    info!(path = %path.display(), records = collection.len(), "Loaded performance results");
    Ok(collection)
}

/// Writes `collection` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_results(collection: &ResultCollection, path: &Path) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(collection.records())?;
    fs::write(path, json).map_err(io_err)?;

    info!(path = %path.display(), records = collection.len(), "Saved performance results");
    Ok(())
}
