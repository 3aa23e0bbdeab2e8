//! Categorical columns of the insurance dataset.
//!
//! Variants are declared in alphabetical order. The one-hot encoder relies on
//! this order: the first variant of each enum is the dropped baseline column.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a categorical value is not one of the known labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {column} value '{value}', expected one of: {expected}")]
pub struct ParseCategoryError {
    /// Column the value was parsed for.
    pub column: &'static str,
    /// The rejected input.
    pub value: String,
    /// Comma separated list of accepted labels.
    pub expected: &'static str,
}

impl ParseCategoryError {
    fn new(column: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            column,
            value: value.to_string(),
            expected,
        }
    }
}

/// Sex of the primary beneficiary.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl FromStr for Sex {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "female" => Ok(Self::Female),
            "male" => Ok(Self::Male),
            _ => Err(ParseCategoryError::new("sex", s, "female, male")),
        }
    }
}

impl TryFrom<String> for Sex {
    type Error = ParseCategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Whether the beneficiary smokes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum Smoker {
    No,
    Yes,
}

impl FromStr for Smoker {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "no" => Ok(Self::No),
            "yes" => Ok(Self::Yes),
            _ => Err(ParseCategoryError::new("smoker", s, "no, yes")),
        }
    }
}

impl TryFrom<String> for Smoker {
    type Error = ParseCategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// US residential area of the beneficiary.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum Region {
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl FromStr for Region {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "northeast" => Ok(Self::Northeast),
            "northwest" => Ok(Self::Northwest),
            "southeast" => Ok(Self::Southeast),
            "southwest" => Ok(Self::Southwest),
            _ => Err(ParseCategoryError::new(
                "region",
                s,
                "northeast, northwest, southeast, southwest",
            )),
        }
    }
}

impl TryFrom<String> for Region {
    type Error = ParseCategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
