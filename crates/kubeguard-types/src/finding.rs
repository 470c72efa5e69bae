use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Namespace marker for findings that are not bound to a single namespace
/// (e.g. cluster-role-binding subjects without a namespace of their own).
pub const CLUSTER_SCOPE: &str = "cluster-wide";

/// Finding severity, totally ordered: `Critical > High > Medium > Low > Info`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// All severities in display order, most severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Checker domain that produced a finding.
///
/// Closed set: every checker maps to exactly one category and the serialized
/// names below appear in saved reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Category {
    #[serde(rename = "Workload Security")]
    WorkloadSecurity,
    #[serde(rename = "Access Control")]
    AccessControl,
    #[serde(rename = "Network Segmentation")]
    NetworkSegmentation,
    #[serde(rename = "Resource Governance")]
    ResourceGovernance,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::WorkloadSecurity => "Workload Security",
            Category::AccessControl => "Access Control",
            Category::NetworkSegmentation => "Network Segmentation",
            Category::ResourceGovernance => "Resource Governance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported misconfiguration instance.
///
/// Findings are immutable once created. `recommendation` states the desired
/// end state; `remediation` states a concrete configuration change. Empty
/// guidance fields mean "no guidance", not an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    pub severity: Severity,
    pub category: Category,
    /// Short summary, stable per rule.
    pub title: String,
    /// Offending object; `<pod>/<container>` when container-scoped.
    pub resource_name: String,
    /// Namespace of the finding, or [`CLUSTER_SCOPE`].
    pub namespace: String,
    pub description: String,
    pub recommendation: String,
    pub remediation: String,
}
