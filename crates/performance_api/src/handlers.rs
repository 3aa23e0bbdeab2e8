//! HTTP request handlers
//!
//! Axum handlers for the performance and prediction API.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use feature_extractor::{FeatureSet, encode_request};
use insurance_structs::{
    HYPERPARAMETER_FIELDS, HyperParameters, ParameterRanges, PredictionRequest,
    PredictionResponse, ResultRecord,
};
use ml_model::in_sample_comparison;
use results_store::PerformanceFilter;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Number of stored sweep results.
    pub records: usize,
    /// Feature set of the pretrained model.
    pub model_features: FeatureSet,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let health = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        records: state.results.len(),
        model_features: state.model.feature_set(),
    };

    (StatusCode::OK, Json(health))
}

/// Returns the stored results matching every supplied hyperparameter.
///
/// # Errors
///
/// Returns 400 when a recognized parameter has a malformed value.
pub async fn get_model_performance(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<ResultRecord>>, ApiError> {
    let Query(pairs) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let filter = parse_filter(&pairs)?;

    let records = state.results.filter(&filter);
    debug!(?filter, matches = records.len(), "Filtered performance results");
    Ok(Json(records))
}

/// Builds a filter from query pairs. The first occurrence of a parameter wins
/// and unrecognized parameters are ignored.
///
/// # Errors
///
/// Returns [`ApiError::InvalidParameter`] naming the first malformed value.
pub fn parse_filter(pairs: &[(String, String)]) -> Result<PerformanceFilter, ApiError> {
    let first = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    Ok(PerformanceFilter {
        n_estimators: first("n_estimators")
            .map(|v| parse_positive("n_estimators", v))
            .transpose()?,
        learning_rate: first("learning_rate")
            .map(|v| parse_finite("learning_rate", v))
            .transpose()?,
        max_depth: first("max_depth")
            .map(|v| parse_positive("max_depth", v))
            .transpose()?,
    })
}

fn parse_positive(name: &'static str, value: &str) -> Result<usize, ApiError> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ApiError::InvalidParameter {
            name,
            value: value.to_string(),
            expected: "a positive integer",
        })
}

fn parse_finite(name: &'static str, value: &str) -> Result<f64, ApiError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::InvalidParameter {
            name,
            value: value.to_string(),
            expected: "a finite number",
        })
}

/// Returns the distinct hyperparameter values of the stored results.
pub async fn get_parameter_ranges(State(state): State<AppState>) -> Json<ParameterRanges> {
    Json(state.results.parameter_ranges())
}

/// Returns the stored result with the lowest RMSE.
///
/// # Errors
///
/// Returns 404 when no results are stored.
pub async fn get_best_config(State(state): State<AppState>) -> Result<Json<ResultRecord>, ApiError> {
    state
        .results
        .best_by_rmse()
        .copied()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No performance results available".to_string()))
}

/// Single prediction or refit comparison, depending on the body.
///
/// A body naming any hyperparameter refits on the dataset and returns the
/// actual and predicted charges of every row. Any other body is a set of
/// feature values for the pretrained model.
///
/// # Errors
///
/// Returns 400 for malformed input, the rejection status when the body cannot
/// be read, and 500 when fitting fails.
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let body = body.map_err(|e| ApiError::Rejected {
        status: e.status(),
        message: e.body_text(),
    })?;
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Request body must be valid JSON: {e}")))?;

    let Value::Object(fields) = &value else {
        return Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };

    if HYPERPARAMETER_FIELDS
        .iter()
        .any(|field| fields.contains_key(*field))
    {
        let params: HyperParameters = serde_json::from_value(value)
            .map_err(|e| ApiError::BadRequest(format!("Invalid hyperparameters: {e}")))?;
        params
            .validate()
            .map_err(|e| ApiError::BadRequest(format!("Invalid hyperparameters: {e}")))?;
        return compare(&state, params).await;
    }

    let request: PredictionRequest = serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid prediction request: {e}")))?;
    let features = encode_request(&request, state.model.feature_set())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let prediction = state.model.predict_row(&features)?;

    debug!(prediction, "Predicted charges");
    Ok(Json(PredictionResponse { prediction }).into_response())
}

async fn compare(state: &AppState, params: HyperParameters) -> Result<Response, ApiError> {
    if let Some(rows) = state
        .comparison_cache
        .as_ref()
        .and_then(|cache| cache.get(&params))
    {
        debug!(?params, "Serving cached comparison");
        return Ok(Json(rows.as_slice()).into_response());
    }

    info!(
        n_estimators = params.n_estimators,
        learning_rate = params.learning_rate,
        max_depth = params.max_depth,
        rows = state.comparison_data.len(),
        "Refitting model for comparison"
    );

    let data = Arc::clone(&state.comparison_data);
    let config = state.model_config;
    let rows = tokio::task::spawn_blocking(move || in_sample_comparison(&data, params, &config))
        .await
        .map_err(|e| ApiError::Internal(format!("fit task failed: {e}")))??;

    let mut rows = Arc::new(rows);
    if let Some(cache) = &state.comparison_cache {
        rows = cache.insert(&params, rows);
    }
    Ok(Json(rows.as_slice()).into_response())
}

/// Fallback for unsupported methods on a known path.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Not found: {}", uri.path()))
}
