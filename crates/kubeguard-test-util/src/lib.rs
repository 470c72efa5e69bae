//! Shared test utilities for the kubeguard workspace.
//!
//! `FakeCluster` is an in-memory [`ClusterAccess`] with per-namespace error
//! injection, so checker and orchestrator tests can exercise the
//! partial-failure policy without a live cluster.

#![forbid(unsafe_code)]

use kubeguard_cluster::model::{
    Capabilities, ClusterIdentity, Container, EgressRule, IngressRule, LabelSelector,
    NetworkPolicy, NetworkPolicyPeer, NetworkPolicySpec, ObjectMeta, Pod, PodSpec,
    ResourceRequirements, RoleBinding, RoleRef, SecurityContext, ServiceAccount, Subject,
};
use kubeguard_cluster::{AccessError, ClusterAccess};
use std::collections::{BTreeMap, BTreeSet};

/// In-memory cluster snapshot acting as a `ClusterAccess`.
#[derive(Default)]
pub struct FakeCluster {
    namespaces: Vec<String>,
    pods: BTreeMap<String, Vec<Pod>>,
    service_accounts: BTreeMap<String, Vec<ServiceAccount>>,
    role_bindings: BTreeMap<String, Vec<RoleBinding>>,
    cluster_role_bindings: Vec<RoleBinding>,
    network_policies: BTreeMap<String, Vec<NetworkPolicy>>,
    broken_namespaces: BTreeSet<String>,
    cluster_scope_broken: bool,
    namespace_listing_broken: bool,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, name: &str) -> Self {
        self.namespaces.push(name.to_string());
        self
    }

    pub fn with_pod(mut self, namespace: &str, pod: Pod) -> Self {
        self.pods.entry(namespace.to_string()).or_default().push(pod);
        self
    }

    pub fn with_service_account(mut self, namespace: &str, account: ServiceAccount) -> Self {
        self.service_accounts
            .entry(namespace.to_string())
            .or_default()
            .push(account);
        self
    }

    pub fn with_role_binding(mut self, namespace: &str, binding: RoleBinding) -> Self {
        self.role_bindings
            .entry(namespace.to_string())
            .or_default()
            .push(binding);
        self
    }

    pub fn with_cluster_role_binding(mut self, binding: RoleBinding) -> Self {
        self.cluster_role_bindings.push(binding);
        self
    }

    pub fn with_network_policy(mut self, namespace: &str, policy: NetworkPolicy) -> Self {
        self.network_policies
            .entry(namespace.to_string())
            .or_default()
            .push(policy);
        self
    }

    /// Every namespaced list call for `name` fails with an API error.
    pub fn with_broken_namespace(mut self, name: &str) -> Self {
        self.broken_namespaces.insert(name.to_string());
        self
    }

    /// `list_cluster_role_bindings` fails.
    pub fn with_broken_cluster_scope(mut self) -> Self {
        self.cluster_scope_broken = true;
        self
    }

    /// `list_namespaces` fails (fatal for a full-cluster scan).
    pub fn with_broken_namespace_listing(mut self) -> Self {
        self.namespace_listing_broken = true;
        self
    }

    fn check_namespace(&self, namespace: Option<&str>) -> Result<(), AccessError> {
        if let Some(ns) = namespace
            && self.broken_namespaces.contains(ns)
        {
            return Err(injected_error(ns));
        }
        Ok(())
    }

    fn collect<T: Clone>(
        &self,
        map: &BTreeMap<String, Vec<T>>,
        namespace: Option<&str>,
    ) -> Result<Vec<T>, AccessError> {
        self.check_namespace(namespace)?;
        Ok(match namespace {
            Some(ns) => map.get(ns).cloned().unwrap_or_default(),
            None => map.values().flatten().cloned().collect(),
        })
    }
}

fn injected_error(what: &str) -> AccessError {
    AccessError::Api {
        status: 500,
        message: format!("injected failure for {what}"),
    }
}

impl ClusterAccess for FakeCluster {
    fn list_namespaces(&self) -> Result<Vec<String>, AccessError> {
        if self.namespace_listing_broken {
            return Err(injected_error("namespace listing"));
        }
        Ok(self.namespaces.clone())
    }

    fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>, AccessError> {
        self.collect(&self.pods, namespace)
    }

    fn list_service_accounts(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<ServiceAccount>, AccessError> {
        self.collect(&self.service_accounts, namespace)
    }

    fn list_role_bindings(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<RoleBinding>, AccessError> {
        self.collect(&self.role_bindings, namespace)
    }

    fn list_cluster_role_bindings(&self) -> Result<Vec<RoleBinding>, AccessError> {
        if self.cluster_scope_broken {
            return Err(injected_error("cluster role bindings"));
        }
        Ok(self.cluster_role_bindings.clone())
    }

    fn list_network_policies(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<NetworkPolicy>, AccessError> {
        self.collect(&self.network_policies, namespace)
    }

    fn cluster_identity(&self) -> Result<ClusterIdentity, AccessError> {
        Ok(ClusterIdentity {
            name: "fake".to_string(),
            server: "https://fake.invalid".to_string(),
            version: "v0.0.0-fake".to_string(),
        })
    }
}

// Snapshot builders.

pub fn pod(name: &str, namespace: &str, containers: Vec<Container>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
            labels: None,
        },
        spec: PodSpec {
            containers,
            service_account_name: None,
        },
    }
}

/// A container with no security context and no resource spec.
pub fn bare_container(name: &str) -> Container {
    Container {
        name: name.to_string(),
        security_context: None,
        resources: None,
    }
}

pub fn container_with_context(name: &str, context: SecurityContext) -> Container {
    Container {
        name: name.to_string(),
        security_context: Some(context),
        resources: None,
    }
}

/// Security context that passes every workload rule.
pub fn hardened_context() -> SecurityContext {
    SecurityContext {
        run_as_user: Some(1000),
        run_as_non_root: Some(true),
        privileged: Some(false),
        allow_privilege_escalation: Some(false),
        read_only_root_filesystem: Some(true),
        capabilities: None,
    }
}

pub fn added_capabilities(caps: &[&str]) -> Capabilities {
    Capabilities {
        add: Some(caps.iter().map(|c| c.to_string()).collect()),
        drop: None,
    }
}

pub fn resources(limits: &[(&str, &str)], requests: &[(&str, &str)]) -> ResourceRequirements {
    let to_map = |entries: &[(&str, &str)]| {
        (!entries.is_empty()).then(|| {
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        })
    };
    ResourceRequirements {
        limits: to_map(limits),
        requests: to_map(requests),
    }
}

pub fn subject(kind: &str, name: &str, namespace: Option<&str>) -> Subject {
    Subject {
        kind: kind.to_string(),
        name: name.to_string(),
        namespace: namespace.map(str::to_string),
    }
}

pub fn role_binding(name: &str, role: &str, subjects: Vec<Subject>) -> RoleBinding {
    RoleBinding {
        metadata: ObjectMeta {
            name: name.to_string(),
            namespace: None,
            labels: None,
        },
        role_ref: RoleRef {
            kind: "ClusterRole".to_string(),
            name: role.to_string(),
        },
        subjects: Some(subjects),
    }
}

pub fn service_account(name: &str, namespace: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: ObjectMeta {
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
            labels: None,
        },
    }
}

/// Selector with an empty `matchLabels`, i.e. "all pods".
pub fn select_all() -> LabelSelector {
    LabelSelector {
        match_labels: Some(BTreeMap::new()),
    }
}

pub fn select_app(app: &str) -> LabelSelector {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), app.to_string());
    LabelSelector {
        match_labels: Some(labels),
    }
}

pub fn network_policy(name: &str, namespace: &str, spec: NetworkPolicySpec) -> NetworkPolicy {
    NetworkPolicy {
        metadata: ObjectMeta {
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
            labels: None,
        },
        spec,
    }
}

/// Ingress rule with no peers, i.e. "allow from everywhere".
pub fn open_ingress() -> IngressRule {
    IngressRule { from: None }
}

pub fn ingress_from(peers: Vec<NetworkPolicyPeer>) -> IngressRule {
    IngressRule { from: Some(peers) }
}

pub fn open_egress() -> EgressRule {
    EgressRule { to: None }
}

pub fn egress_to(peers: Vec<NetworkPolicyPeer>) -> EgressRule {
    EgressRule { to: Some(peers) }
}

pub fn peer_namespaces(selector: LabelSelector) -> NetworkPolicyPeer {
    NetworkPolicyPeer {
        pod_selector: None,
        namespace_selector: Some(selector),
    }
}

pub fn peer_pods(selector: LabelSelector) -> NetworkPolicyPeer {
    NetworkPolicyPeer {
        pod_selector: Some(selector),
        namespace_selector: None,
    }
}

/// Policy selecting all pods with both rule lists absent: default-deny in
/// both directions.
pub fn default_deny_policy(name: &str, namespace: &str) -> NetworkPolicy {
    network_policy(
        name,
        namespace,
        NetworkPolicySpec {
            pod_selector: Some(select_all()),
            ingress: None,
            egress: None,
        },
    )
}
