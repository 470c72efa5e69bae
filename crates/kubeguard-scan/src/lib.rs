//! Scan orchestration.
//!
//! The scanner resolves the target namespace set, runs the four checkers in a
//! fixed order, and concatenates their findings in that order. Failure policy
//! is three-tiered: per-namespace failures are absorbed inside each checker,
//! a whole-checker failure is recorded as a diagnostic and contributes zero
//! findings, and only a failure to resolve the namespace set at all aborts
//! the scan.

#![forbid(unsafe_code)]

use kubeguard_checks::{
    AccessControlChecker, Checker, NetworkSegmentationChecker, ResourceGovernanceChecker,
    WorkloadSecurityChecker,
};
use kubeguard_cluster::{AccessError, ClusterAccess};
use kubeguard_types::Finding;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// What to scan: one namespace, or everything the accessor can list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanTarget {
    All,
    Namespace(String),
}

/// Fatal scan errors. Anything below namespace resolution degrades instead
/// of failing.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to resolve target namespaces: {0}")]
    NamespaceResolution(#[source] AccessError),
}

/// A checker that contributed zero findings because it failed outright.
/// Surfaced to the operator, never stored in the report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckerFailure {
    pub checker: &'static str,
    pub error: String,
}

/// Progress notifications for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanEvent {
    NamespacesResolved(usize),
    CheckerStarted(&'static str),
    CheckerFinished(&'static str, usize),
    CheckerFailed(&'static str, String),
}

/// Result of a completed scan: the aggregated finding sequence in checker
/// order, plus any checker-level diagnostics.
#[derive(Clone, Debug, Default)]
pub struct ScanRun {
    pub namespaces: Vec<String>,
    pub findings: Vec<Finding>,
    pub failures: Vec<CheckerFailure>,
}

/// An interrupted scan produces no partial report.
#[derive(Clone, Debug)]
pub enum ScanOutcome {
    Completed(ScanRun),
    Interrupted,
}

pub struct Scanner<'a> {
    cluster: &'a dyn ClusterAccess,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Scanner<'a> {
    pub fn new(cluster: &'a dyn ClusterAccess) -> Self {
        Self {
            cluster,
            cancel: None,
        }
    }

    /// Cooperative cancellation: the flag is checked between checkers, so an
    /// interrupt ends the scan at the next checker boundary.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn run(&self, target: &ScanTarget) -> Result<ScanOutcome, ScanError> {
        self.run_with(target, &mut |_| {})
    }

    pub fn run_with(
        &self,
        target: &ScanTarget,
        observe: &mut dyn FnMut(ScanEvent),
    ) -> Result<ScanOutcome, ScanError> {
        let namespaces = match target {
            ScanTarget::Namespace(namespace) => vec![namespace.clone()],
            ScanTarget::All => self
                .cluster
                .list_namespaces()
                .map_err(ScanError::NamespaceResolution)?,
        };
        observe(ScanEvent::NamespacesResolved(namespaces.len()));

        // Fixed order; the aggregated sequence preserves it.
        let checkers: Vec<Box<dyn Checker + '_>> = vec![
            Box::new(WorkloadSecurityChecker::new(self.cluster)),
            Box::new(AccessControlChecker::new(self.cluster)),
            Box::new(NetworkSegmentationChecker::new(self.cluster)),
            Box::new(ResourceGovernanceChecker::new(self.cluster)),
        ];

        match run_checkers(&namespaces, checkers, self.cancel, observe) {
            Some((findings, failures)) => Ok(ScanOutcome::Completed(ScanRun {
                namespaces,
                findings,
                failures,
            })),
            None => Ok(ScanOutcome::Interrupted),
        }
    }
}

/// Runs checkers in order with per-checker isolation. Returns `None` when
/// cancelled; a cancelled scan must not leak a partial finding sequence.
fn run_checkers(
    namespaces: &[String],
    checkers: Vec<Box<dyn Checker + '_>>,
    cancel: Option<&AtomicBool>,
    observe: &mut dyn FnMut(ScanEvent),
) -> Option<(Vec<Finding>, Vec<CheckerFailure>)> {
    let cancelled = || cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));

    let mut findings = Vec::new();
    let mut failures = Vec::new();
    for checker in checkers {
        if cancelled() {
            return None;
        }
        observe(ScanEvent::CheckerStarted(checker.name()));
        match checker.check(namespaces) {
            Ok(found) => {
                observe(ScanEvent::CheckerFinished(checker.name(), found.len()));
                findings.extend(found);
            }
            Err(err) => {
                log::warn!("checker {} failed: {err}", checker.name());
                observe(ScanEvent::CheckerFailed(checker.name(), err.to_string()));
                failures.push(CheckerFailure {
                    checker: checker.name(),
                    error: err.to_string(),
                });
            }
        }
    }
    if cancelled() {
        return None;
    }
    Some((findings, failures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeguard_test_util::{
        FakeCluster, bare_container, pod, role_binding, subject,
    };
    use kubeguard_types::{Category, Severity};

    struct FailingChecker;

    impl Checker for FailingChecker {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn check(&self, _namespaces: &[String]) -> Result<Vec<Finding>, AccessError> {
            Err(AccessError::Api {
                status: 503,
                message: "backend down".to_string(),
            })
        }
    }

    struct StaticChecker(&'static str);

    impl Checker for StaticChecker {
        fn name(&self) -> &'static str {
            self.0
        }

        fn check(&self, _namespaces: &[String]) -> Result<Vec<Finding>, AccessError> {
            Ok(vec![Finding {
                severity: Severity::Info,
                category: Category::WorkloadSecurity,
                title: self.0.to_string(),
                resource_name: String::new(),
                namespace: String::new(),
                description: String::new(),
                recommendation: String::new(),
                remediation: String::new(),
            }])
        }
    }

    fn e2e_cluster() -> FakeCluster {
        // One namespace, one unhardened pod with no resource spec, no network
        // policies, and cluster-admin granted to a non-default subject.
        FakeCluster::new()
            .with_namespace("default")
            .with_pod("default", pod("web", "default", vec![bare_container("app")]))
            .with_cluster_role_binding(role_binding(
                "grant-alice",
                "cluster-admin",
                vec![subject("User", "alice", None)],
            ))
    }

    fn completed(outcome: ScanOutcome) -> ScanRun {
        match outcome {
            ScanOutcome::Completed(run) => run,
            ScanOutcome::Interrupted => panic!("scan was interrupted"),
        }
    }

    #[test]
    fn full_scan_aggregates_in_checker_order() {
        let cluster = e2e_cluster();
        let run = completed(
            Scanner::new(&cluster)
                .run(&ScanTarget::All)
                .expect("scan"),
        );

        assert_eq!(run.namespaces, vec!["default".to_string()]);
        assert!(run.failures.is_empty());

        // Category blocks appear in checker order.
        let categories: Vec<Category> = run.findings.iter().map(|f| f.category).collect();
        let mut deduped = categories.clone();
        deduped.dedup();
        assert_eq!(
            deduped,
            vec![
                Category::WorkloadSecurity,
                Category::AccessControl,
                Category::NetworkSegmentation,
                Category::ResourceGovernance,
            ]
        );
    }

    #[test]
    fn e2e_scenario_matches_expected_findings() {
        let cluster = e2e_cluster();
        let run = completed(
            Scanner::new(&cluster)
                .run(&ScanTarget::All)
                .expect("scan"),
        );

        assert!(
            run.findings
                .iter()
                .any(|f| f.severity == Severity::Critical
                    && f.title == "Container running as root (UID 0)")
        );
        assert!(
            run.findings
                .iter()
                .any(|f| f.severity == Severity::Medium
                    && f.title == "No resource limits or requests defined")
        );

        let access: Vec<_> = run
            .findings
            .iter()
            .filter(|f| f.category == Category::AccessControl)
            .collect();
        assert_eq!(access.len(), 1);
        assert_eq!(access[0].severity, Severity::High);

        let network: Vec<_> = run
            .findings
            .iter()
            .filter(|f| f.category == Category::NetworkSegmentation)
            .collect();
        assert_eq!(network.len(), 1);
        assert_eq!(network[0].severity, Severity::High);
        assert_eq!(network[0].title, "No network policies defined");
    }

    #[test]
    fn single_namespace_target_skips_namespace_listing() {
        // Namespace listing is broken, but a single-namespace scan never needs it.
        let cluster = FakeCluster::new()
            .with_broken_namespace_listing()
            .with_pod("dev", pod("web", "dev", vec![bare_container("app")]));
        let run = completed(
            Scanner::new(&cluster)
                .run(&ScanTarget::Namespace("dev".to_string()))
                .expect("scan"),
        );
        assert_eq!(run.namespaces, vec!["dev".to_string()]);
        assert!(!run.findings.is_empty());
    }

    #[test]
    fn namespace_listing_failure_is_fatal() {
        let cluster = FakeCluster::new().with_broken_namespace_listing();
        let err = Scanner::new(&cluster)
            .run(&ScanTarget::All)
            .expect_err("must fail");
        assert!(matches!(err, ScanError::NamespaceResolution(_)));
    }

    #[test]
    fn failing_checker_is_isolated() {
        let namespaces = vec!["dev".to_string()];
        let checkers: Vec<Box<dyn Checker>> = vec![
            Box::new(StaticChecker("first")),
            Box::new(FailingChecker),
            Box::new(StaticChecker("third")),
        ];
        let mut events = Vec::new();
        let (findings, failures) =
            run_checkers(&namespaces, checkers, None, &mut |event| events.push(event))
                .expect("not cancelled");

        let titles: Vec<&str> = findings.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "third"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].checker, "failing");
        assert!(failures[0].error.contains("backend down"));
        assert!(events.contains(&ScanEvent::CheckerFailed(
            "failing",
            "cluster API returned 503: backend down".to_string()
        )));
    }

    #[test]
    fn cancelled_scan_produces_no_output() {
        let cluster = e2e_cluster();
        let flag = AtomicBool::new(true);
        let outcome = Scanner::new(&cluster)
            .with_cancel(&flag)
            .run(&ScanTarget::All)
            .expect("scan");
        assert!(matches!(outcome, ScanOutcome::Interrupted));
    }

    #[test]
    fn events_report_progress_in_order() {
        let cluster = e2e_cluster();
        let mut events = Vec::new();
        let outcome = Scanner::new(&cluster)
            .run_with(&ScanTarget::All, &mut |event| events.push(event))
            .expect("scan");
        let _ = completed(outcome);

        assert_eq!(events[0], ScanEvent::NamespacesResolved(1));
        assert_eq!(events[1], ScanEvent::CheckerStarted("workload security"));
        assert!(matches!(
            events[2],
            ScanEvent::CheckerFinished("workload security", _)
        ));
    }
}
