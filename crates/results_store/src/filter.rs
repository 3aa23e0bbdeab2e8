use insurance_structs::ResultRecord;

/// Exact-match filter over result records. Unset fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceFilter {
    pub n_estimators: Option<usize>,
    pub learning_rate: Option<f64>,
    pub max_depth: Option<usize>,
}

impl PerformanceFilter {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n_estimators.is_none() && self.learning_rate.is_none() && self.max_depth.is_none()
    }

    /// Returns whether `record` equals every set field.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, record: &ResultRecord) -> bool {
        self.n_estimators.is_none_or(|n| record.n_estimators == n)
            && self.learning_rate.is_none_or(|lr| record.learning_rate == lr)
            && self.max_depth.is_none_or(|d| record.max_depth == d)
    }
}
