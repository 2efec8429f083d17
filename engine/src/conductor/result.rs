//! Aggregate result of one plan execution

use crate::conductor::types::Plan;
use sdk::types::{Dataset, DownloadedFile};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything the steps of one run produced, plus their error messages
///
/// Each step adds to exactly one list (or sets `summary`) on success, or
/// appends one message to `errors` on failure. Empty members are left out
/// of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    #[serde(default, skip_serializing_if = "plan_is_empty")]
    pub plan: Option<Plan>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datasets: Vec<Dataset>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<DownloadedFile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visualisations: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

fn plan_is_empty(plan: &Option<Plan>) -> bool {
    plan.as_ref().map_or(true, Plan::is_empty)
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the plan that produced this result
    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// True if any step produced output
    pub fn has_output(&self) -> bool {
        !self.datasets.is_empty()
            || !self.files.is_empty()
            || !self.data.is_empty()
            || !self.visualisations.is_empty()
            || self.summary.is_some()
    }

    /// True if some steps failed while others produced output
    pub fn is_partial(&self) -> bool {
        self.has_output() && !self.errors.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
