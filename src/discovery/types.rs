use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder for any identity field that could not be determined.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(rename = "cluster_name")]
    pub name: String,
    #[serde(rename = "cluster_version")]
    pub version: String,
}

impl Default for ClusterInfo {
    fn default() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Ready,
    NotReady,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    pub status: NodeStatus,
    /// Kubelet version reported by the node.
    pub version: String,
    /// Address type (`InternalIP`, `ExternalIP`, `Hostname`, ...) to address.
    pub addresses: BTreeMap<String, String>,
}

/// One cycle's snapshot of the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub timestamp: DateTime<Utc>,
    pub cluster_info: ClusterInfo,
    pub node_count: usize,
    pub nodes: Vec<NodeInfo>,
    #[serde(rename = "discovery_duration")]
    pub duration: String,
}
