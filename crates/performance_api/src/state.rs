//! Read-only server state shared by all handlers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use feature_extractor::TrainingData;
use insurance_structs::{ComparisonRow, HyperParameterKey, HyperParameters};
use ml_model::{GradientBoostingRegressor, ModelConfig};
use parking_lot::RwLock;
use results_store::ResultCollection;

/// Everything the handlers need, built once before the server starts.
#[derive(Clone)]
pub struct AppState {
    /// Precomputed sweep results.
    pub results: Arc<ResultCollection>,
    /// Pretrained model for single predictions.
    pub model: Arc<GradientBoostingRegressor>,
    /// Encoded dataset refitted by comparison requests.
    pub comparison_data: Arc<TrainingData>,
    pub model_config: ModelConfig,
    pub comparison_cache: Option<Arc<ComparisonCache>>,
}

impl AppState {
    #[must_use]
    pub fn new(
        results: ResultCollection,
        model: GradientBoostingRegressor,
        comparison_data: TrainingData,
    ) -> Self {
        Self {
            results: Arc::new(results),
            model: Arc::new(model),
            comparison_data: Arc::new(comparison_data),
            model_config: ModelConfig::default(),
            comparison_cache: None,
        }
    }

    /// Enables caching of comparisons for the triples in the results file.
    #[must_use]
    pub fn with_comparison_cache(mut self) -> Self {
        self.comparison_cache = Some(Arc::new(ComparisonCache::for_results(&self.results)));
        self
    }
}

/// Comparison results keyed by hyperparameter triple.
///
/// Only triples present in the sweep results are stored, so the cache never
/// grows beyond the size of the grid. Entries are never replaced.
#[derive(Debug, Default)]
pub struct ComparisonCache {
    allowed: HashSet<HyperParameterKey>,
    entries: RwLock<HashMap<HyperParameterKey, Arc<Vec<ComparisonRow>>>>,
}

impl ComparisonCache {
    #[must_use]
    pub fn for_results(results: &ResultCollection) -> Self {
        Self {
            allowed: results
                .records()
                .iter()
                .map(|record| record.hyperparameters().key())
                .collect(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn get(&self, params: &HyperParameters) -> Option<Arc<Vec<ComparisonRow>>> {
        self.entries.read().get(&params.key()).cloned()
    }

    /// Stores `rows` if the triple is cacheable and not yet cached. Returns the
    /// entry that is now cached, or `rows` itself when the triple is not
    /// cacheable.
    pub fn insert(
        &self,
        params: &HyperParameters,
        rows: Arc<Vec<ComparisonRow>>,
    ) -> Arc<Vec<ComparisonRow>> {
        let key = params.key();
        if !self.allowed.contains(&key) {
            return rows;
        }
        Arc::clone(self.entries.write().entry(key).or_insert(rows))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
