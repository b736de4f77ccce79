//! Result document model.
//!
//! The metrics engine writes a JSON document with up to three result groups
//! plus an opaque `insights` payload. Rows are read tolerantly: the fields
//! this service inspects are typed, everything else round-trips untouched
//! through a flattened map so engine-side additions survive re-serialization.

use serde::{Deserialize, Serialize};

/// Warning attached when the engine finished but produced no rows.
pub const EMPTY_RESULTS_WARNING: &str =
    "Analysis produced no result rows; check the input file format and KPI configuration.";

/// One KPI comparison row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Segment label (the original data calls this the device).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kpi_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplift: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    /// Set when the engine could not compute this row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Engine fields this service does not interpret (denominator sizes,
    /// per-variation breakdowns, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The metrics engine's output document, plus the two fields the
/// orchestrator attaches before delivery (`warning`, `useAI`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_results: Vec<KpiRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_results: Vec<KpiRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_results: Vec<KpiRow>,
    /// AI-generated summary/recommendation payload; passed through opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, rename = "useAI", skip_serializing_if = "Option::is_none")]
    pub use_ai: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ResultDocument {
    /// Whether any result group contains at least one row.
    pub fn has_rows(&self) -> bool {
        !self.primary_results.is_empty()
            || !self.secondary_results.is_empty()
            || !self.additional_results.is_empty()
    }

    /// Attach the empty-results warning unless rows are present.
    pub fn warn_if_empty(&mut self) {
        if !self.has_rows() {
            self.warning = Some(EMPTY_RESULTS_WARNING.to_string());
        }
    }
}
