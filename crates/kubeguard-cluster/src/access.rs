//! The capability trait the checking engine consumes.

use crate::model::{ClusterIdentity, NetworkPolicy, Pod, RoleBinding, ServiceAccount};
use thiserror::Error;

/// Errors surfaced by a cluster accessor.
///
/// The engine never matches on variants beyond logging them; the split exists
/// so operators can tell credential problems from API rejections.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("failed to load cluster configuration: {0}")]
    Config(String),

    #[error("cluster request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("cluster API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode cluster response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read-only access to the declared cluster state.
///
/// `namespace: None` means cluster-wide for the namespaced list calls.
/// Implementations must not mutate cluster state; retries and pagination are
/// an implementation concern and invisible to callers.
pub trait ClusterAccess {
    fn list_namespaces(&self) -> Result<Vec<String>, AccessError>;

    fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>, AccessError>;

    fn list_service_accounts(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<ServiceAccount>, AccessError>;

    fn list_role_bindings(&self, namespace: Option<&str>)
    -> Result<Vec<RoleBinding>, AccessError>;

    fn list_cluster_role_bindings(&self) -> Result<Vec<RoleBinding>, AccessError>;

    fn list_network_policies(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<NetworkPolicy>, AccessError>;

    /// Cluster name/server/version for the banner; not used by any rule.
    fn cluster_identity(&self) -> Result<ClusterIdentity, AccessError>;
}
