//! Cluster data access for kubeguard.
//!
//! This crate owns the boundary between the checking engine and the cluster:
//! - typed, read-only resource snapshots with optional fields where the API
//!   allows omission (`model`)
//! - the [`ClusterAccess`] capability trait the checkers consume (`access`)
//! - kubeconfig / in-cluster credential resolution (`kubeconfig`)
//! - a blocking HTTP client over the Kubernetes REST API (`client`)
//!
//! The checkers never talk to the network directly; they only see
//! `ClusterAccess`, so tests substitute an in-memory implementation.

#![forbid(unsafe_code)]

pub mod access;
pub mod client;
pub mod kubeconfig;
pub mod model;

pub use access::{AccessError, ClusterAccess};
pub use client::KubeClient;
pub use kubeconfig::ClusterConfig;
pub use model::{
    Capabilities, ClusterIdentity, Container, EgressRule, IngressRule, LabelSelector,
    NetworkPolicy, NetworkPolicyPeer, NetworkPolicySpec, ObjectMeta, Pod, PodSpec,
    ResourceRequirements, RoleBinding, RoleRef, SecurityContext, ServiceAccount, Subject,
};
