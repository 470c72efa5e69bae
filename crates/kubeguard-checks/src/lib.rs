//! The rule checkers: each one audits a single configuration domain over
//! cluster snapshots and emits [`Finding`]s.
//!
//! Checkers are stateless between runs and share nothing but the read-only
//! accessor. A namespace whose fetch fails is skipped with a warning; the
//! scan never aborts because one namespace is unreadable.

#![forbid(unsafe_code)]

use kubeguard_cluster::AccessError;
use kubeguard_types::Finding;

pub mod access_control;
pub mod governance;
pub mod network;
pub mod workload;


pub use access_control::AccessControlChecker;
pub use governance::ResourceGovernanceChecker;
pub use network::NetworkSegmentationChecker;
pub use workload::WorkloadSecurityChecker;

/// Namespaces carrying this prefix belong to the platform itself; the
/// segmentation and governance checkers skip them before fetching anything.
pub const SYSTEM_NAMESPACE_PREFIX: &str = "kube-";

pub fn is_system_namespace(namespace: &str) -> bool {
    namespace.starts_with(SYSTEM_NAMESPACE_PREFIX)
}

/// One security-rule domain.
///
/// `check` returns a freshly computed finding sequence each call. An `Err`
/// here is the top-level safety net consumed by the orchestrator; routine
/// per-namespace fetch failures are absorbed internally and never surface.
pub trait Checker {
    fn name(&self) -> &'static str;

    fn check(&self, namespaces: &[String]) -> Result<Vec<Finding>, AccessError>;
}
