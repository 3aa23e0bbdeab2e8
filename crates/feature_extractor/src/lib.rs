//! Feature extractor crate for the insurance charges model.
//!
//! This crate turns dataset rows and prediction requests into the fixed
//! numeric feature vectors the model is trained on. Categorical columns are
//! one-hot encoded with the first (alphabetical) category dropped, so the
//! baselines are `female`, `no` and `northeast`.

use core::fmt;
use core::str::FromStr;

use dataset_loader::Dataset;
use insurance_structs::{InsuranceRecord, PredictionRequest, Region, Sex, Smoker};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;

/// The number of features in the full encoding.
pub const FEATURE_COUNT: usize = 8;

/// Column names of the full encoding, in feature vector order.
pub const FULL_FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "bmi",
    "children",
    "sex_male",
    "smoker_yes",
    "region_northwest",
    "region_southeast",
    "region_southwest",
];

/// Column names of the numeric-only encoding.
pub const NUMERIC_FEATURE_NAMES: [&str; 3] = ["age", "bmi", "children"];

/// Which columns a model is trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSet {
    /// Numeric columns followed by the one-hot encoded categoricals.
    #[default]
    Full,
    /// Only `age`, `bmi` and `children`.
    Numeric,
}

impl FeatureSet {
    /// Returns the length of the feature vector.
    #[must_use]
    pub const fn width(self) -> usize {
        self.column_names().len()
    }

    /// Returns the column names in feature vector order.
    #[must_use]
    pub const fn column_names(self) -> &'static [&'static str] {
        match self {
            Self::Full => &FULL_FEATURE_NAMES,
            Self::Numeric => &NUMERIC_FEATURE_NAMES,
        }
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::Numeric => f.write_str("numeric"),
        }
    }
}

impl FromStr for FeatureSet {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "numeric" => Ok(Self::Numeric),
            _ => Err(EncodeError::UnknownFeatureSet(s.to_string())),
        }
    }
}

/// Errors raised while encoding prediction input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{field} must be a finite non-negative number, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },

    #[error("missing field `region`, required by a model trained on the full feature set")]
    MissingRegion,

    #[error("unknown feature set '{0}', expected 'full' or 'numeric'")]
    UnknownFeatureSet(String),
}

/// Encoded features paired with their regression targets.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingData {
    feature_set: FeatureSet,
    features: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl TrainingData {
    /// Creates training data from pre-encoded rows.
    #[must_use]
    pub const fn new(feature_set: FeatureSet, features: Vec<Vec<f64>>, targets: Vec<f64>) -> Self {
        Self {
            feature_set,
            features,
            targets,
        }
    }

    /// Encodes every dataset row with the given feature set.
    #[must_use]
    pub fn from_dataset(dataset: &Dataset, feature_set: FeatureSet) -> Self {
        let features = dataset
            .records()
            .iter()
            .map(|record| encode_record(record, feature_set))
            .collect();

        Self::new(feature_set, features, dataset.targets())
    }

    /// Returns the rows at `indices`, in the order given.
    ///
    /// Out-of-range indices are skipped.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let (features, targets) = indices
            .iter()
            .filter_map(|&i| Some((self.features.get(i)?.clone(), *self.targets.get(i)?)))
            .unzip();

        Self::new(self.feature_set, features, targets)
    }

    #[must_use]
    pub const fn feature_set(&self) -> FeatureSet {
        self.feature_set
    }

    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    #[must_use]
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Encodes a dataset row.
#[must_use]
pub fn encode_record(record: &InsuranceRecord, feature_set: FeatureSet) -> Vec<f64> {
    let mut features = Vec::with_capacity(feature_set.width());
    features.extend([record.age, record.bmi, f64::from(record.children)]);

    if feature_set == FeatureSet::Full {
        push_categoricals(&mut features, record.sex, record.smoker, record.region);
    }

    features
}

/// Encodes a prediction request with the same column order used at training
/// time.
///
/// # Errors
///
/// Returns an error if a numeric field is negative or not finite, or if the
/// full feature set is requested without a region.
pub fn encode_request(
    request: &PredictionRequest,
    feature_set: FeatureSet,
) -> Result<Vec<f64>, EncodeError> {
    let age = check_number("age", request.age)?;
    let bmi = check_number("bmi", request.bmi)?;
    let children = check_number("children", request.children)?;

    let mut features = Vec::with_capacity(feature_set.width());
    features.extend([age, bmi, children]);

    if feature_set == FeatureSet::Full {
        let region = request.region.ok_or(EncodeError::MissingRegion)?;
        push_categoricals(&mut features, request.sex, request.smoker, region);
    }

    Ok(features)
}

fn push_categoricals(features: &mut Vec<f64>, sex: Sex, smoker: Smoker, region: Region) {
    one_hot(features, sex);
    one_hot(features, smoker);
    one_hot(features, region);
}

/// Appends one indicator per category, skipping the baseline (first) one.
fn one_hot<T: IntoEnumIterator + PartialEq>(features: &mut Vec<f64>, value: T) {
    features.extend(
        T::iter()
            .skip(1)
            .map(|category| if category == value { 1.0 } else { 0.0 }),
    );
}

fn check_number(field: &'static str, value: f64) -> Result<f64, EncodeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(EncodeError::InvalidNumber { field, value })
    }
}
