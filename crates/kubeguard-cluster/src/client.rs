//! Blocking HTTP client over the Kubernetes REST API.

use crate::access::{AccessError, ClusterAccess};
use crate::kubeconfig::ClusterConfig;
use crate::model::{ClusterIdentity, NetworkPolicy, Pod, RoleBinding, ServiceAccount};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const CORE_V1: &str = "/api/v1";
const RBAC_V1: &str = "/apis/rbac.authorization.k8s.io/v1";
const NETWORKING_V1: &str = "/apis/networking.k8s.io/v1";

/// One connected cluster. Read-only: every request this client issues is a GET.
pub struct KubeClient {
    http: reqwest::blocking::Client,
    server: String,
    cluster_name: String,
    token: Option<String>,
}

impl KubeClient {
    pub fn connect(config: ClusterConfig) -> Result<Self, AccessError> {
        let mut builder = reqwest::blocking::Client::builder().use_rustls_tls();
        if let Some(ca) = &config.ca_cert_pem {
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(ca)?);
        }
        if let Some(identity) = &config.client_identity_pem {
            builder = builder.identity(reqwest::Identity::from_pem(identity)?);
        }
        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            server: config.server.trim_end_matches('/').to_string(),
            cluster_name: config.name,
            token: config.token,
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AccessError> {
        let url = format!("{}{}", self.server, path);
        log::debug!("GET {url}");
        let mut request = self.http.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(AccessError::Api {
                status: status.as_u16(),
                message: truncate_message(&message),
            });
        }
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, AccessError> {
        self.get::<ObjectList<T>>(path).map(|list| list.items)
    }
}

/// One path for the namespaced and cluster-wide flavors of a list endpoint.
fn list_path(api_prefix: &str, namespace: Option<&str>, plural: &str) -> String {
    match namespace {
        Some(ns) => format!("{api_prefix}/namespaces/{ns}/{plural}"),
        None => format!("{api_prefix}/{plural}"),
    }
}

fn truncate_message(message: &str) -> String {
    const MAX: usize = 300;
    let trimmed = message.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let mut end = MAX;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

#[derive(Deserialize)]
struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct NamespaceItem {
    metadata: NamespaceMeta,
}

#[derive(Deserialize)]
struct NamespaceMeta {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo {
    #[serde(default)]
    git_version: String,
    #[serde(default)]
    major: String,
    #[serde(default)]
    minor: String,
}

impl ClusterAccess for KubeClient {
    fn list_namespaces(&self) -> Result<Vec<String>, AccessError> {
        let items: Vec<NamespaceItem> = self.get_list(&format!("{CORE_V1}/namespaces"))?;
        Ok(items.into_iter().map(|ns| ns.metadata.name).collect())
    }

    fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>, AccessError> {
        self.get_list(&list_path(CORE_V1, namespace, "pods"))
    }

    fn list_service_accounts(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<ServiceAccount>, AccessError> {
        self.get_list(&list_path(CORE_V1, namespace, "serviceaccounts"))
    }

    fn list_role_bindings(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<RoleBinding>, AccessError> {
        self.get_list(&list_path(RBAC_V1, namespace, "rolebindings"))
    }

    fn list_cluster_role_bindings(&self) -> Result<Vec<RoleBinding>, AccessError> {
        self.get_list(&format!("{RBAC_V1}/clusterrolebindings"))
    }

    fn list_network_policies(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<NetworkPolicy>, AccessError> {
        self.get_list(&list_path(NETWORKING_V1, namespace, "networkpolicies"))
    }

    fn cluster_identity(&self) -> Result<ClusterIdentity, AccessError> {
        let version: VersionInfo = self.get("/version")?;
        let version = if !version.git_version.is_empty() {
            version.git_version
        } else if !version.major.is_empty() {
            format!("{}.{}", version.major, version.minor)
        } else {
            "unknown".to_string()
        };
        Ok(ClusterIdentity {
            name: self.cluster_name.clone(),
            server: self.server.clone(),
            version,
        })
    }
}
