//! Network segmentation rules: missing policies, permissive rules, and the
//! absence of a default-deny baseline.

use crate::{Checker, is_system_namespace};
use kubeguard_cluster::model::{NetworkPolicy, NetworkPolicyPeer};
use kubeguard_cluster::{AccessError, ClusterAccess};
use kubeguard_types::{Category, Finding, Severity};

/// Placeholder resource name for namespace-level findings that do not point
/// at a single policy object.
const NAMESPACE_WIDE: &str = "NetworkPolicy";

pub struct NetworkSegmentationChecker<'a> {
    cluster: &'a dyn ClusterAccess,
}

impl<'a> NetworkSegmentationChecker<'a> {
    pub fn new(cluster: &'a dyn ClusterAccess) -> Self {
        Self { cluster }
    }

    fn check_namespace(&self, namespace: &str, out: &mut Vec<Finding>) -> Result<(), AccessError> {
        let policies = self.cluster.list_network_policies(Some(namespace))?;
        let pods = self.cluster.list_pods(Some(namespace))?;

        if policies.is_empty() {
            if !pods.is_empty() {
                out.push(finding(
                    Severity::High,
                    "No network policies defined",
                    NAMESPACE_WIDE,
                    namespace,
                    format!(
                        "Namespace {namespace:?} has {} pod(s) but no network policies",
                        pods.len()
                    ),
                    "Implement network policies to control traffic between pods",
                    "Create default-deny ingress/egress policies and allow only \
                     necessary traffic",
                ));
            }
            return Ok(());
        }

        for policy in &policies {
            check_policy_rules(policy, namespace, out);
        }

        if !policies.iter().any(is_default_deny) {
            out.push(finding(
                Severity::Medium,
                "Missing default deny policy",
                NAMESPACE_WIDE,
                namespace,
                "No default-deny network policy found in namespace".to_string(),
                "Implement a default-deny policy and explicitly allow required traffic",
                "Create a policy that selects all pods and omits the ingress/egress \
                 rule lists",
            ));
        }
        Ok(())
    }
}

impl Checker for NetworkSegmentationChecker<'_> {
    fn name(&self) -> &'static str {
        "network segmentation"
    }

    fn check(&self, namespaces: &[String]) -> Result<Vec<Finding>, AccessError> {
        let mut findings = Vec::new();
        for namespace in namespaces {
            if is_system_namespace(namespace) {
                continue;
            }
            if let Err(err) = self.check_namespace(namespace, &mut findings) {
                log::warn!("network segmentation: skipping namespace {namespace}: {err}");
            }
        }
        Ok(findings)
    }
}

/// Each permissive rule is reported individually; egress over-permission is
/// judged lower severity than ingress.
fn check_policy_rules(policy: &NetworkPolicy, namespace: &str, out: &mut Vec<Finding>) {
    let policy_name = policy.metadata.name.as_str();

    for rule in policy.spec.ingress.iter().flatten() {
        if peers_too_permissive(rule.from.as_deref()) {
            out.push(finding(
                Severity::Medium,
                "Overly permissive ingress rule",
                policy_name,
                namespace,
                "Network policy has an ingress rule allowing traffic from all sources"
                    .to_string(),
                "Restrict ingress to specific namespaces or pod selectors",
                "Add a namespaceSelector or podSelector to limit traffic sources",
            ));
        }
    }

    for rule in policy.spec.egress.iter().flatten() {
        if peers_too_permissive(rule.to.as_deref()) {
            out.push(finding(
                Severity::Low,
                "Overly permissive egress rule",
                policy_name,
                namespace,
                "Network policy allows unrestricted egress traffic".to_string(),
                "Restrict egress to specific destinations",
                "Add specific namespaceSelector or podSelector entries to the to: section",
            ));
        }
    }
}

/// An absent/empty peer list allows everything; so does any peer whose
/// namespace selector is present but unconstrained.
fn peers_too_permissive(peers: Option<&[NetworkPolicyPeer]>) -> bool {
    let Some(peers) = peers else {
        return true;
    };
    if peers.is_empty() {
        return true;
    }
    peers.iter().any(|peer| {
        peer.namespace_selector
            .as_ref()
            .is_some_and(|selector| selector.selects_all())
    })
}

/// Default-deny: selects all pods while omitting at least one of the
/// ingress/egress rule lists entirely.
fn is_default_deny(policy: &NetworkPolicy) -> bool {
    let selects_all = policy
        .spec
        .pod_selector
        .as_ref()
        .is_some_and(|selector| selector.selects_all());
    selects_all && (policy.spec.ingress.is_none() || policy.spec.egress.is_none())
}

fn finding(
    severity: Severity,
    title: &str,
    resource: &str,
    namespace: &str,
    description: String,
    recommendation: &str,
    remediation: &str,
) -> Finding {
    Finding {
        severity,
        category: Category::NetworkSegmentation,
        title: title.to_string(),
        resource_name: resource.to_string(),
        namespace: namespace.to_string(),
        description,
        recommendation: recommendation.to_string(),
        remediation: remediation.to_string(),
    }
}
