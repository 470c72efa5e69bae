//! Read-only snapshots of the cluster resources the checkers evaluate.
//!
//! These mirror the Kubernetes API shapes, trimmed to the fields the rules
//! actually look at. Every field the API may omit is an `Option`; the rule
//! layer decides what absence means (usually "unsafe default").

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: Option<String>,
    pub labels: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodSpec {
    pub containers: Vec<Container>,
    pub service_account_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    pub name: String,
    pub security_context: Option<SecurityContext>,
    pub resources: Option<ResourceRequirements>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityContext {
    pub run_as_user: Option<i64>,
    pub run_as_non_root: Option<bool>,
    pub privileged: Option<bool>,
    pub allow_privilege_escalation: Option<bool>,
    pub read_only_root_filesystem: Option<bool>,
    pub capabilities: Option<Capabilities>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Capabilities {
    pub add: Option<Vec<String>>,
    pub drop: Option<Vec<String>>,
}

/// Requests and limits keyed by resource name (`cpu`, `memory`, ...).
/// Quantities stay as opaque strings; the rules only test for presence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceRequirements {
    pub limits: Option<BTreeMap<String, String>>,
    pub requests: Option<BTreeMap<String, String>>,
}

impl ResourceRequirements {
    pub fn has_limit(&self, resource: &str) -> bool {
        self.limits
            .as_ref()
            .is_some_and(|limits| limits.contains_key(resource))
    }

    pub fn has_request(&self, resource: &str) -> bool {
        self.requests
            .as_ref()
            .is_some_and(|requests| requests.contains_key(resource))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceAccount {
    pub metadata: ObjectMeta,
}

/// A role binding. Namespace-scoped `RoleBinding` and cluster-scoped
/// `ClusterRoleBinding` share this shape; the accessor method used to fetch
/// them determines the scope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleBinding {
    pub metadata: ObjectMeta,
    pub role_ref: RoleRef,
    pub subjects: Option<Vec<Subject>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleRef {
    pub kind: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subject {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkPolicy {
    pub metadata: ObjectMeta,
    pub spec: NetworkPolicySpec,
}

/// `ingress`/`egress` distinguish "list absent" from "list present but
/// empty": an absent list is what makes a policy default-deny for that
/// direction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkPolicySpec {
    pub pod_selector: Option<LabelSelector>,
    pub ingress: Option<Vec<IngressRule>>,
    pub egress: Option<Vec<EgressRule>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngressRule {
    pub from: Option<Vec<NetworkPolicyPeer>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EgressRule {
    pub to: Option<Vec<NetworkPolicyPeer>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkPolicyPeer {
    pub pod_selector: Option<LabelSelector>,
    pub namespace_selector: Option<LabelSelector>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelSelector {
    pub match_labels: Option<BTreeMap<String, String>>,
}

impl LabelSelector {
    /// A selector with no label constraints selects every object.
    pub fn selects_all(&self) -> bool {
        self.match_labels
            .as_ref()
            .is_none_or(|labels| labels.is_empty())
    }
}

/// Cluster name/server/version, used only for the connection banner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterIdentity {
    pub name: String,
    pub server: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_decodes_from_api_json() {
        let json = r#"{
            "metadata": {"name": "web", "namespace": "default"},
            "spec": {
                "containers": [{
                    "name": "app",
                    "securityContext": {
                        "runAsUser": 0,
                        "allowPrivilegeEscalation": true,
                        "capabilities": {"add": ["CAP_SYS_ADMIN"]}
                    },
                    "resources": {"limits": {"memory": "512Mi"}}
                }]
            }
        }"#;
        let pod: Pod = serde_json::from_str(json).expect("decode pod");
        assert_eq!(pod.metadata.name, "web");
        let container = &pod.spec.containers[0];
        let ctx = container.security_context.as_ref().expect("security context");
        assert_eq!(ctx.run_as_user, Some(0));
        assert_eq!(ctx.allow_privilege_escalation, Some(true));
        let resources = container.resources.as_ref().expect("resources");
        assert!(resources.has_limit("memory"));
        assert!(!resources.has_limit("cpu"));
        assert!(!resources.has_request("memory"));
    }

    #[test]
    fn pod_tolerates_missing_optional_fields() {
        let json = r#"{"metadata": {"name": "bare"}, "spec": {"containers": [{"name": "c"}]}}"#;
        let pod: Pod = serde_json::from_str(json).expect("decode pod");
        assert!(pod.spec.containers[0].security_context.is_none());
        assert!(pod.spec.containers[0].resources.is_none());
        assert!(pod.metadata.namespace.is_none());
    }

    #[test]
    fn network_policy_absent_vs_empty_rule_lists() {
        let deny_all: NetworkPolicy = serde_json::from_str(
            r#"{"metadata": {"name": "deny"}, "spec": {"podSelector": {}}}"#,
        )
        .expect("decode policy");
        assert!(deny_all.spec.ingress.is_none());
        assert!(deny_all.spec.pod_selector.expect("selector").selects_all());

        let open: NetworkPolicy = serde_json::from_str(
            r#"{"metadata": {"name": "open"}, "spec": {"podSelector": {}, "ingress": [{}]}}"#,
        )
        .expect("decode policy");
        let ingress = open.spec.ingress.expect("ingress");
        assert_eq!(ingress.len(), 1);
        assert!(ingress[0].from.is_none());
    }

    #[test]
    fn selector_with_labels_does_not_select_all() {
        let selector: LabelSelector =
            serde_json::from_str(r#"{"matchLabels": {"app": "web"}}"#).expect("decode");
        assert!(!selector.selects_all());
    }

    #[test]
    fn role_binding_decodes_subjects() {
        let json = r#"{
            "metadata": {"name": "grant-admin"},
            "roleRef": {"kind": "ClusterRole", "name": "cluster-admin"},
            "subjects": [{"kind": "ServiceAccount", "name": "default", "namespace": "dev"}]
        }"#;
        let binding: RoleBinding = serde_json::from_str(json).expect("decode binding");
        assert_eq!(binding.role_ref.name, "cluster-admin");
        let subjects = binding.subjects.expect("subjects");
        assert_eq!(subjects[0].namespace.as_deref(), Some("dev"));
    }
}
