//! Report generation: a pure function of the aggregated finding sequence.
//!
//! The reporter owns severity grouping, the summary breakdowns, and the
//! posture label. It holds no mutable state, so the same finding sequence can
//! be rendered as text and serialized as JSON from one scan.

#![forbid(unsafe_code)]

mod summary;
mod text;

pub use summary::{Posture, group_by_severity, posture, summarize};
pub use text::TextRenderer;

use kubeguard_types::{Finding, ScanMetadata, ScanReport};
use time::OffsetDateTime;

/// Assemble the persistable report envelope from the aggregated findings.
pub fn build_report(
    findings: Vec<Finding>,
    scanner_version: &str,
    timestamp: OffsetDateTime,
) -> ScanReport {
    let summary = summarize(&findings);
    ScanReport {
        scan_metadata: ScanMetadata {
            timestamp,
            total_findings: findings.len() as u32,
            scanner_version: scanner_version.to_string(),
        },
        summary,
        findings,
    }
}

/// Serialize a report to the stable JSON layout.
pub fn to_json(report: &ScanReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
