//! Resource governance rules: missing requests and limits.

use crate::{Checker, is_system_namespace};
use kubeguard_cluster::model::Container;
use kubeguard_cluster::{AccessError, ClusterAccess};
use kubeguard_types::{Category, Finding, Severity};

pub struct ResourceGovernanceChecker<'a> {
    cluster: &'a dyn ClusterAccess,
}

impl<'a> ResourceGovernanceChecker<'a> {
    pub fn new(cluster: &'a dyn ClusterAccess) -> Self {
        Self { cluster }
    }
}

impl Checker for ResourceGovernanceChecker<'_> {
    fn name(&self) -> &'static str {
        "resource governance"
    }

    fn check(&self, namespaces: &[String]) -> Result<Vec<Finding>, AccessError> {
        let mut findings = Vec::new();
        for namespace in namespaces {
            if is_system_namespace(namespace) {
                continue;
            }
            let pods = match self.cluster.list_pods(Some(namespace)) {
                Ok(pods) => pods,
                Err(err) => {
                    log::warn!("resource governance: skipping namespace {namespace}: {err}");
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

fn check_container(namespace: &str, pod: &str, container: &Container, out: &mut Vec<Finding>) {
    let resource = format!("{pod}/{}", container.name);

    // No resource spec at all: one finding, the four sub-checks would be
    // redundant.
    let Some(resources) = container.resources.as_ref() else {
        out.push(finding(
            Severity::Medium,
            "No resource limits or requests defined",
            &resource,
            namespace,
            "Container has no resource limits or requests defined",
            "Define both resource requests and limits",
            "Add resources.requests and resources.limits for CPU and memory",
        ));
        return;
    };

    if !resources.has_limit("cpu") {
        out.push(finding(
            Severity::Low,
            "Missing CPU limit",
            &resource,
            namespace,
            "Container has no CPU limit defined",
            "Set CPU limits to prevent resource exhaustion",
            "Add resources.limits.cpu (e.g. \"500m\" or \"1\")",
        ));
    }

    // Memory exhaustion is judged worse than CPU throttling.
    if !resources.has_limit("memory") {
        out.push(finding(
            Severity::Medium,
            "Missing memory limit",
            &resource,
            namespace,
            "Container has no memory limit defined, risking out-of-memory kills",
            "Set memory limits to keep the pod from consuming excessive memory",
            "Add resources.limits.memory (e.g. \"512Mi\" or \"1Gi\")",
        ));
    }

    if !resources.has_request("cpu") {
        out.push(finding(
            Severity::Low,
            "Missing CPU request",
            &resource,
            namespace,
            "Container has no CPU request defined",
            "Set CPU requests for proper scheduling",
            "Add resources.requests.cpu (e.g. \"250m\")",
        ));
    }

    if !resources.has_request("memory") {
        out.push(finding(
            Severity::Low,
            "Missing memory request",
            &resource,
            namespace,
            "Container has no memory request defined",
            "Set memory requests for proper scheduling",
            "Add resources.requests.memory (e.g. \"256Mi\")",
        ));
    }
}

fn finding(
    severity: Severity,
    title: &str,
    resource: &str,
    namespace: &str,
    description: &str,
    recommendation: &str,
    remediation: &str,
) -> Finding {
    Finding {
        severity,
        category: Category::ResourceGovernance,
        title: title.to_string(),
        resource_name: resource.to_string(),
        namespace: namespace.to_string(),
        description: description.to_string(),
        recommendation: recommendation.to_string(),
        remediation: remediation.to_string(),
    }
}
