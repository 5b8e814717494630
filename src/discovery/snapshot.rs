//! Pure node listing → [`DiscoveryResult`] transformation.

use crate::discovery::types::{ClusterInfo, DiscoveryResult, NodeInfo, NodeStatus};
use chrono::Utc;
use k8s_openapi::api::core::v1::{Node, NodeCondition};
use std::collections::BTreeMap;
use std::time::Instant;

const READY_CONDITION: &str = "Ready";
const CONDITION_TRUE: &str = "True";

/// `listing_started` marks the start of the node-listing call; the elapsed
/// time until the snapshot is complete becomes the result's duration.
pub fn build_snapshot(
    nodes: &[Node],
    cluster_info: ClusterInfo,
    listing_started: Instant,
) -> DiscoveryResult {
    let nodes: Vec<NodeInfo> = nodes.iter().map(NodeInfo::from_k8s_node).collect();

    DiscoveryResult {
        timestamp: Utc::now(),
        cluster_info,
        node_count: nodes.len(),
        nodes,
        duration: format!("{:?}", listing_started.elapsed()),
    }
}

impl NodeInfo {
    pub fn from_k8s_node(node: &Node) -> Self {
        let status = node.status.as_ref();

        let conditions = status
            .and_then(|s| s.conditions.as_deref())
            .unwrap_or(&[]);

        // Repeated address types keep the last one listed.
        let addresses: BTreeMap<String, String> = status
            .and_then(|s| s.addresses.as_ref())
            .into_iter()
            .flatten()
            .map(|a| (a.type_.clone(), a.address.clone()))
            .collect();

        Self {
            name: node.metadata.name.clone().unwrap_or_default(),
            status: node_status(conditions),
            version: status
                .and_then(|s| s.node_info.as_ref())
                .map(|i| i.kubelet_version.clone())
                .unwrap_or_default(),
            addresses,
        }
    }
}

pub fn node_status(conditions: &[NodeCondition]) -> NodeStatus {
    match conditions.iter().find(|c| c.type_ == READY_CONDITION) {
        Some(c) if c.status == CONDITION_TRUE => NodeStatus::Ready,
        Some(_) => NodeStatus::NotReady,
        None => NodeStatus::Unknown,
    }
}
