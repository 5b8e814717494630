//! The narrow query surface the discovery cycle needs from a cluster.
//!
//! Everything here is read-only. `K8sClient` implements it against a live
//! API server; tests substitute in-memory fakes.

use crate::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Node};

#[async_trait]
pub trait ClusterQuery: Send + Sync {
    /// List every node, in the order the API server returns them.
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap>;

    async fn list_config_maps(&self, namespace: &str) -> Result<Vec<ConfigMap>>;

    async fn get_namespace(&self, name: &str) -> Result<Namespace>;

    /// The server's reported `gitVersion`, e.g. `v1.31.2`.
    async fn server_version(&self) -> Result<String>;
}
