use serde::{Deserialize, Serialize};

use crate::{Region, Sex, Smoker};

/// One row of the insurance charges dataset.
///
/// Field order matches the CSV header
/// `age,sex,bmi,children,smoker,region,charges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceRecord {
    /// Age of the primary beneficiary in years.
    pub age: f64,
    pub sex: Sex,
    /// Body mass index.
    pub bmi: f64,
    /// Number of dependents covered.
    pub children: u32,
    pub smoker: Smoker,
    pub region: Region,
    /// Individual medical costs billed by the insurer (the regression target).
    pub charges: f64,
}
