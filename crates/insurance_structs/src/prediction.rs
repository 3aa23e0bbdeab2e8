use serde::{Deserialize, Serialize};

use crate::{Region, Sex, Smoker};

/// Feature values submitted for a single-prediction request.
///
/// `region` is only required by models trained on the full feature set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub age: f64,
    pub bmi: f64,
    pub children: f64,
    pub sex: Sex,
    pub smoker: Smoker,
    #[serde(default)]
    pub region: Option<Region>,
}

/// Successful single-prediction response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Predicted charges.
    pub prediction: f64,
}

/// Actual versus predicted charges for one dataset row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Row position in the dataset.
    pub index: usize,
    pub actual: f64,
    pub predicted: f64,
}
