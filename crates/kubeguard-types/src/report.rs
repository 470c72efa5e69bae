use crate::Finding;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Metadata about one scan run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScanMetadata {
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub total_findings: u32,
    pub scanner_version: String,
}

/// Aggregate counts over the finding sequence.
///
/// Breakdown maps only carry keys that actually occurred; a severity with
/// zero findings is simply absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScanSummary {
    pub severity_breakdown: BTreeMap<String, u32>,
    pub category_breakdown: BTreeMap<String, u32>,
    pub total_issues: u32,
}

/// The persisted report: metadata, summary, and the full finding sequence
/// verbatim. Serializes to the stable `scan_metadata` / `summary` /
/// `findings` layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScanReport {
    pub scan_metadata: ScanMetadata,
    pub summary: ScanSummary,
    pub findings: Vec<Finding>,
}
