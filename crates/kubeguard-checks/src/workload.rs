//! Workload hardening rules: per-container security context audit.

use crate::Checker;
use kubeguard_cluster::model::{Container, SecurityContext};
use kubeguard_cluster::{AccessError, ClusterAccess};
use kubeguard_types::{Category, Finding, Severity};

/// Linux capabilities that effectively grant host-level control.
/// Matched case-insensitively, with or without a `CAP_` prefix.
const DANGEROUS_CAPABILITIES: &[&str] = &[
    "SYS_ADMIN",
    "NET_ADMIN",
    "SYS_MODULE",
    "SYS_RAWIO",
    "SYS_PTRACE",
    "SYS_BOOT",
    "MAC_ADMIN",
    "MAC_OVERRIDE",
];

pub struct WorkloadSecurityChecker<'a> {
    cluster: &'a dyn ClusterAccess,
}

impl<'a> WorkloadSecurityChecker<'a> {
    pub fn new(cluster: &'a dyn ClusterAccess) -> Self {
        Self { cluster }
    }
}

impl Checker for WorkloadSecurityChecker<'_> {
    fn name(&self) -> &'static str {
        "workload security"
    }

    fn check(&self, namespaces: &[String]) -> Result<Vec<Finding>, AccessError> {
        let mut findings = Vec::new();
        for namespace in namespaces {
            let pods = match self.cluster.list_pods(Some(namespace)) {
                Ok(pods) => pods,
                Err(err) => {
                    log::warn!("workload security: skipping namespace {namespace}: {err}");
                    continue;
                }
            };
            for pod in &pods {
                for container in &pod.spec.containers {
                    check_container(namespace, &pod.metadata.name, container, &mut findings);
                }
            }
        }
        Ok(findings)
    }
}

/// Evaluates the six independent workload rules, in fixed order. A single
/// container can trigger anywhere from zero to all six.
fn check_container(namespace: &str, pod: &str, container: &Container, out: &mut Vec<Finding>) {
    let resource = format!("{pod}/{}", container.name);
    let context = container.security_context.as_ref();

    if runs_as_root(context) {
        out.push(finding(
            Severity::Critical,
            "Container running as root (UID 0)",
            &resource,
            namespace,
            format!(
                "Container {:?} in pod {pod:?} runs as the root user (UID 0) \
                 or does not rule out running as root",
                container.name
            ),
            "Set runAsUser to a non-zero value in securityContext",
            "Add securityContext with runAsUser: 1000 (or any non-zero UID) \
             and runAsNonRoot: true",
        ));
    }

    if context.and_then(|c| c.privileged).unwrap_or(false) {
        out.push(finding(
            Severity::Critical,
            "Privileged container detected",
            &resource,
            namespace,
            format!("Container {:?} is running in privileged mode", container.name),
            "Remove privileged: true from securityContext unless absolutely necessary",
            "Set privileged: false or remove the privileged field entirely",
        ));
    }

    let dangerous = dangerous_capabilities(context);
    if !dangerous.is_empty() {
        out.push(finding(
            Severity::High,
            "Dangerous capabilities granted",
            &resource,
            namespace,
            format!(
                "Container has dangerous capabilities: {}",
                dangerous.join(", ")
            ),
            "Remove unnecessary capabilities, especially SYS_ADMIN and NET_ADMIN",
            "Drop all capabilities and add back only the required ones via \
             drop: [\"ALL\"] and add: [...]",
        ));
    }

    if allows_privilege_escalation(context) {
        out.push(finding(
            Severity::High,
            "Privilege escalation allowed",
            &resource,
            namespace,
            "Container allows privilege escalation".to_string(),
            "Set allowPrivilegeEscalation: false in securityContext",
            "Add allowPrivilegeEscalation: false to the container securityContext",
        ));
    }

    if context.is_none() {
        out.push(finding(
            Severity::Medium,
            "Missing security context",
            &resource,
            namespace,
            "Container has no securityContext defined".to_string(),
            "Define a securityContext with appropriate settings",
            "Add securityContext with runAsNonRoot: true and \
             allowPrivilegeEscalation: false",
        ));
    }

    if !context
        .and_then(|c| c.read_only_root_filesystem)
        .unwrap_or(false)
    {
        out.push(finding(
            Severity::Low,
            "Root filesystem is writable",
            &resource,
            namespace,
            "Container root filesystem is not read-only".to_string(),
            "Set readOnlyRootFilesystem: true unless write access is required",
            "Add readOnlyRootFilesystem: true to securityContext and mount \
             volumes for writable data",
        ));
    }
}

/// Absence of configuration counts as the unsafe default: no security
/// context, an explicit UID 0, or an unset UID without runAsNonRoot.
fn runs_as_root(context: Option<&SecurityContext>) -> bool {
    let Some(context) = context else {
        return true;
    };
    match context.run_as_user {
        Some(0) => true,
        Some(_) => false,
        None => !context.run_as_non_root.unwrap_or(false),
    }
}

/// Same unsafe-default policy as [`runs_as_root`]: only an explicit `false`
/// suppresses the finding.
fn allows_privilege_escalation(context: Option<&SecurityContext>) -> bool {
    context
        .and_then(|c| c.allow_privilege_escalation)
        .unwrap_or(true)
}

/// All denylisted capabilities the container adds, normalized to their
/// uppercase un-prefixed names. One finding lists every match.
fn dangerous_capabilities(context: Option<&SecurityContext>) -> Vec<String> {
    let Some(added) = context
        .and_then(|c| c.capabilities.as_ref())
        .and_then(|c| c.add.as_ref())
    else {
        return Vec::new();
    };
    added
        .iter()
        .filter_map(|cap| {
            let upper = cap.trim().to_ascii_uppercase();
            let name = upper.strip_prefix("CAP_").unwrap_or(&upper);
            DANGEROUS_CAPABILITIES
                .contains(&name)
                .then(|| name.to_string())
        })
        .collect()
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
        category: Category::WorkloadSecurity,
        title: title.to_string(),
        resource_name: resource.to_string(),
        namespace: namespace.to_string(),
        description,
        recommendation: recommendation.to_string(),
        remediation: remediation.to_string(),
    }
}
