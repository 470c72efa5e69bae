//! Stable DTOs shared across the kubeguard workspace.
//!
//! This crate is intentionally boring:
//! - the `Finding` produced by every checker
//! - severity and category enumerations
//! - the persisted report envelope (`scan_metadata` / `summary` / `findings`)
//!
//! The JSON field names here are a compatibility contract with downstream
//! consumers of saved reports; do not rename them.

#![forbid(unsafe_code)]

pub mod finding;
pub mod report;

pub use finding::{CLUSTER_SCOPE, Category, Finding, Severity};
pub use report::{ScanMetadata, ScanReport, ScanSummary};
