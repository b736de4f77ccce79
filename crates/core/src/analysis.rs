//! Analysis request configuration: KPI definitions, per-file metadata, and
//! the merged configuration document handed to the metrics engine.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Report-order labels a file can be tagged with, in submission order.
pub const REPORT_ORDERS: [&str; 4] = ["1st report", "2nd report", "3rd report", "final report"];

/// Report order applied when the client supplies none.
pub const DEFAULT_REPORT_ORDER: &str = "1st report";

/// Statistical treatment of one KPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiKind {
    /// Numerator over denominator, compared as a proportion.
    Rate,
    /// Revenue totals, compared per-user.
    Revenue,
    /// Revenue per visitor.
    Rpv,
    /// Plain numerator comparison without a rate test.
    Simple,
    /// Metric that only exists on the variation side.
    VariationOnly,
}

/// Result group a KPI's rows are filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiCategory {
    Primary,
    Secondary,
    Additional,
}

/// One user-defined KPI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiConfig {
    pub name: String,
    /// Metric row label for the numerator (meaning varies by kind).
    #[serde(default)]
    pub numerator: String,
    /// Metric row label for the denominator; empty for kinds without one.
    #[serde(default)]
    pub denominator: String,
    #[serde(rename = "type")]
    pub kind: KpiKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<KpiCategory>,
}

/// The client-supplied statistical configuration (the `config` upload part).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub kpis: Vec<KpiConfig>,
    /// Number of variation arms tested against control.
    #[serde(default = "default_variation_count")]
    pub variation_count: u32,
    /// Segment names to break results down by (empty = auto-detect).
    #[serde(default)]
    pub segments: Vec<String>,
    /// Whether AI-generated insights were requested.
    #[serde(default, rename = "useAI")]
    pub use_ai: bool,
}

fn default_variation_count() -> u32 {
    1
}

impl AnalysisConfig {
    /// Structural checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.variation_count == 0 {
            return Err(CoreError::Validation(
                "variationCount must be at least 1".to_string(),
            ));
        }
        if let Some(kpi) = self.kpis.iter().find(|k| k.name.trim().is_empty()) {
            return Err(CoreError::Validation(format!(
                "KPI of type {:?} has an empty name",
                kpi.kind
            )));
        }
        Ok(())
    }
}

/// Per-file tags supplied alongside the upload (the `fileMetadata` part),
/// positionally matched to the uploaded files. Every field is optional;
/// missing values fall back to defaults at staging time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub report_order: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// One staged input file as recorded in the merged configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedFileEntry {
    pub path: String,
    pub country: String,
    pub report_order: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// The merged configuration document written once per job and read by the
/// metrics engine: user settings plus the resolved staged-file list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(flatten)]
    pub settings: AnalysisConfig,
    pub files: Vec<StagedFileEntry>,
    /// Always set; the engines gate their diagnostic output on it.
    pub debug: bool,
}
