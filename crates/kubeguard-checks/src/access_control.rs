//! Access-control rules: over-privileged role bindings.
//!
//! Two passes: cluster-scope bindings first, then each target namespace. A
//! cluster-scope fetch failure aborts only the cluster-scope pass.

use crate::Checker;
use kubeguard_cluster::model::Subject;
use kubeguard_cluster::{AccessError, ClusterAccess};
use kubeguard_types::{CLUSTER_SCOPE, Category, Finding, Severity};

/// The built-in role with unrestricted cluster access.
pub const CLUSTER_ADMIN_ROLE: &str = "cluster-admin";

/// Role names that grant broad namespace-level permissions.
pub const ELEVATED_ROLES: &[&str] = &["admin", "cluster-admin", "edit"];

/// The implicitly provisioned service identity every namespace carries.
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

pub struct AccessControlChecker<'a> {
    cluster: &'a dyn ClusterAccess,
}

impl<'a> AccessControlChecker<'a> {
    pub fn new(cluster: &'a dyn ClusterAccess) -> Self {
        Self { cluster }
    }

    fn check_cluster_scope(&self, out: &mut Vec<Finding>) {
        let bindings = match self.cluster.list_cluster_role_bindings() {
            Ok(bindings) => bindings,
            Err(err) => {
                log::warn!("access control: skipping cluster-scope pass: {err}");
                return;
            }
        };
        for binding in &bindings {
            if binding.role_ref.name != CLUSTER_ADMIN_ROLE {
                continue;
            }
            for subject in binding.subjects.iter().flatten() {
                out.push(flag_cluster_admin(&binding.metadata.name, subject));
            }
        }
    }

    fn check_namespace(&self, namespace: &str, out: &mut Vec<Finding>) {
        let bindings = match self.cluster.list_role_bindings(Some(namespace)) {
            Ok(bindings) => bindings,
            Err(err) => {
                log::warn!("access control: skipping namespace {namespace}: {err}");
                return;
            }
        };
        for binding in &bindings {
            let role = binding.role_ref.name.as_str();
            if !ELEVATED_ROLES.contains(&role) {
                continue;
            }
            for subject in binding.subjects.iter().flatten() {
                out.push(flag_elevated(&binding.metadata.name, namespace, subject, role));
            }
        }
    }
}

impl Checker for AccessControlChecker<'_> {
    fn name(&self) -> &'static str {
        "access control"
    }

    fn check(&self, namespaces: &[String]) -> Result<Vec<Finding>, AccessError> {
        let mut findings = Vec::new();
        self.check_cluster_scope(&mut findings);
        for namespace in namespaces {
            self.check_namespace(namespace, &mut findings);
        }
        Ok(findings)
    }
}

/// cluster-admin for the default service identity is the worst case: every
/// pod in that namespace inherits full cluster control.
fn flag_cluster_admin(binding_name: &str, subject: &Subject) -> Finding {
    let severity = if subject.name == DEFAULT_SERVICE_ACCOUNT {
        Severity::Critical
    } else {
        Severity::High
    };
    Finding {
        severity,
        category: Category::AccessControl,
        title: format!("cluster-admin role granted to {}", subject.kind),
        resource_name: binding_name.to_string(),
        namespace: subject
            .namespace
            .clone()
            .unwrap_or_else(|| CLUSTER_SCOPE.to_string()),
        description: format!(
            "{} {:?} has cluster-admin privileges (full cluster access)",
            subject.kind, subject.name
        ),
        recommendation: "Use least-privilege RBAC and grant only the permissions required"
            .to_string(),
        remediation: "Create a custom role with specific permissions instead of cluster-admin"
            .to_string(),
    }
}

fn flag_elevated(binding_name: &str, namespace: &str, subject: &Subject, role: &str) -> Finding {
    let severity = if subject.name == DEFAULT_SERVICE_ACCOUNT {
        Severity::High
    } else {
        Severity::Medium
    };
    Finding {
        severity,
        category: Category::AccessControl,
        title: format!("Elevated role \"{role}\" granted to {}", subject.kind),
        resource_name: binding_name.to_string(),
        namespace: namespace.to_string(),
        description: format!(
            "{} {:?} has the {role:?} role with broad permissions",
            subject.kind, subject.name
        ),
        recommendation: "Review whether this level of access is necessary".to_string(),
        remediation: "Consider a custom role with the minimal required permissions".to_string(),
    }
}
