//! Kubeconfig and in-cluster credential resolution.
//!
//! Resolution order: explicit path, `KUBECONFIG`, `~/.kube/config`, then the
//! in-cluster service-account mount. Only the current context is honored;
//! exec plugins and auth providers are out of scope.

use crate::access::AccessError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

const IN_CLUSTER_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const IN_CLUSTER_CA: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Resolved connection material for one cluster.
#[derive(Clone, Debug)]
pub struct ClusterConfig {
    /// Cluster name from the kubeconfig context, for the banner.
    pub name: String,
    pub server: String,
    pub token: Option<String>,
    /// PEM-encoded certificate authority, if pinned.
    pub ca_cert_pem: Option<Vec<u8>>,
    /// PEM bundle of client certificate + key for mTLS auth.
    pub client_identity_pem: Option<Vec<u8>>,
    pub accept_invalid_certs: bool,
}

/// Load connection material, trying kubeconfig sources then in-cluster.
pub fn load(explicit: Option<&Utf8Path>) -> Result<ClusterConfig, AccessError> {
    if let Some(path) = resolve_kubeconfig_path(explicit) {
        let text = std::fs::read_to_string(&path)
            .map_err(|err| AccessError::Config(format!("read {path}: {err}")))?;
        return parse_kubeconfig(&text, path.parent());
    }
    if Utf8Path::new(IN_CLUSTER_TOKEN).exists() {
        return in_cluster_config();
    }
    Err(AccessError::Config(
        "no kubeconfig found (tried --kubeconfig, $KUBECONFIG, ~/.kube/config) \
         and not running in-cluster"
            .to_string(),
    ))
}

fn resolve_kubeconfig_path(explicit: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    if let Ok(env_path) = std::env::var("KUBECONFIG")
        && !env_path.trim().is_empty()
    {
        return Some(Utf8PathBuf::from(env_path));
    }
    let home = std::env::var("HOME").ok()?;
    let default = Utf8PathBuf::from(home).join(".kube").join("config");
    default.exists().then_some(default)
}

fn in_cluster_config() -> Result<ClusterConfig, AccessError> {
    let token = std::fs::read_to_string(IN_CLUSTER_TOKEN)
        .map_err(|err| AccessError::Config(format!("read service-account token: {err}")))?;
    let ca = std::fs::read(IN_CLUSTER_CA)
        .map_err(|err| AccessError::Config(format!("read service-account CA: {err}")))?;
    let host = std::env::var("KUBERNETES_SERVICE_HOST")
        .map_err(|_| AccessError::Config("KUBERNETES_SERVICE_HOST is not set".to_string()))?;
    let port =
        std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());
    Ok(ClusterConfig {
        name: "in-cluster".to_string(),
        server: format!("https://{host}:{port}"),
        token: Some(token.trim().to_string()),
        ca_cert_pem: Some(ca),
        client_identity_pem: None,
        accept_invalid_certs: false,
    })
}

// Kubeconfig file shapes; only the fields we honor.

#[derive(Debug, Deserialize)]
struct Kubeconfig {
    #[serde(rename = "current-context")]
    current_context: Option<String>,
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    users: Vec<NamedUser>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
struct ClusterEntry {
    server: String,
    #[serde(rename = "certificate-authority-data")]
    certificate_authority_data: Option<String>,
    #[serde(rename = "certificate-authority")]
    certificate_authority: Option<String>,
    #[serde(rename = "insecure-skip-tls-verify", default)]
    insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    user: UserEntry,
}

#[derive(Debug, Default, Deserialize)]
struct UserEntry {
    token: Option<String>,
    #[serde(rename = "client-certificate-data")]
    client_certificate_data: Option<String>,
    #[serde(rename = "client-key-data")]
    client_key_data: Option<String>,
    #[serde(rename = "client-certificate")]
    client_certificate: Option<String>,
    #[serde(rename = "client-key")]
    client_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,
    user: Option<String>,
}

/// Parse a kubeconfig document and resolve its current context.
///
/// `base_dir` anchors relative certificate/key file references.
pub fn parse_kubeconfig(
    text: &str,
    base_dir: Option<&Utf8Path>,
) -> Result<ClusterConfig, AccessError> {
    let config: Kubeconfig = serde_yaml::from_str(text)
        .map_err(|err| AccessError::Config(format!("parse kubeconfig: {err}")))?;

    let context_name = config
        .current_context
        .as_deref()
        .ok_or_else(|| AccessError::Config("kubeconfig has no current-context".to_string()))?;
    let context = config
        .contexts
        .iter()
        .find(|c| c.name == context_name)
        .map(|c| &c.context)
        .ok_or_else(|| {
            AccessError::Config(format!("current-context {context_name:?} not found"))
        })?;

    let cluster = config
        .clusters
        .iter()
        .find(|c| c.name == context.cluster)
        .map(|c| &c.cluster)
        .ok_or_else(|| {
            AccessError::Config(format!("cluster {:?} not found in kubeconfig", context.cluster))
        })?;

    let user = context
        .user
        .as_deref()
        .and_then(|name| config.users.iter().find(|u| u.name == name))
        .map(|u| &u.user);

    let ca_cert_pem = match (&cluster.certificate_authority_data, &cluster.certificate_authority) {
        (Some(data), _) => Some(decode_b64("certificate-authority-data", data)?),
        (None, Some(path)) => Some(read_relative(base_dir, path)?),
        (None, None) => None,
    };

    let mut token = None;
    let mut client_identity_pem = None;
    if let Some(user) = user {
        token = user.token.clone();
        let cert = match (&user.client_certificate_data, &user.client_certificate) {
            (Some(data), _) => Some(decode_b64("client-certificate-data", data)?),
            (None, Some(path)) => Some(read_relative(base_dir, path)?),
            (None, None) => None,
        };
        let key = match (&user.client_key_data, &user.client_key) {
            (Some(data), _) => Some(decode_b64("client-key-data", data)?),
            (None, Some(path)) => Some(read_relative(base_dir, path)?),
            (None, None) => None,
        };
        if let (Some(cert), Some(key)) = (cert, key) {
            let mut bundle = cert;
            bundle.push(b'\n');
            bundle.extend_from_slice(&key);
            client_identity_pem = Some(bundle);
        }
    }

    Ok(ClusterConfig {
        name: context.cluster.clone(),
        server: cluster.server.clone(),
        token,
        ca_cert_pem,
        client_identity_pem,
        accept_invalid_certs: cluster.insecure_skip_tls_verify,
    })
}

fn decode_b64(field: &str, data: &str) -> Result<Vec<u8>, AccessError> {
    BASE64
        .decode(data.trim())
        .map_err(|err| AccessError::Config(format!("decode {field}: {err}")))
}

fn read_relative(base_dir: Option<&Utf8Path>, path: &str) -> Result<Vec<u8>, AccessError> {
    let path = Utf8Path::new(path);
    let resolved = match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_owned(),
    };
    std::fs::read(&resolved)
        .map_err(|err| AccessError::Config(format!("read {resolved}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
  - name: dev-cluster
    cluster:
      server: https://10.0.0.1:6443
      insecure-skip-tls-verify: true
users:
  - name: dev-user
    user:
      token: sekret
contexts:
  - name: dev
    context:
      cluster: dev-cluster
      user: dev-user
"#;

    #[test]
    fn resolves_current_context() {
        let config = parse_kubeconfig(SAMPLE, None).expect("parse");
        assert_eq!(config.name, "dev-cluster");
        assert_eq!(config.server, "https://10.0.0.1:6443");
        assert_eq!(config.token.as_deref(), Some("sekret"));
        assert!(config.accept_invalid_certs);
        assert!(config.ca_cert_pem.is_none());
    }

    #[test]
    fn missing_context_is_a_config_error() {
        let text = SAMPLE.replace("current-context: dev", "current-context: prod");
        let err = parse_kubeconfig(&text, None).expect_err("should fail");
        assert!(matches!(err, AccessError::Config(_)));
        assert!(err.to_string().contains("prod"));
    }

    #[test]
    fn decodes_certificate_authority_data() {
        let ca = BASE64.encode("---fake pem---");
        let text = SAMPLE.replace(
            "insecure-skip-tls-verify: true",
            &format!("certificate-authority-data: {ca}"),
        );
        let config = parse_kubeconfig(&text, None).expect("parse");
        assert_eq!(config.ca_cert_pem.as_deref(), Some(b"---fake pem---".as_slice()));
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn builds_client_identity_bundle() {
        let cert = BASE64.encode("CERT");
        let key = BASE64.encode("KEY");
        let text = SAMPLE.replace(
            "token: sekret",
            &format!("client-certificate-data: {cert}\n      client-key-data: {key}"),
        );
        let config = parse_kubeconfig(&text, None).expect("parse");
        assert_eq!(
            config.client_identity_pem.as_deref(),
            Some(b"CERT\nKEY".as_slice())
        );
        assert!(config.token.is_none());
    }
}
