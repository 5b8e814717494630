//! The discovery cycle: resolve identity, list nodes, build a snapshot.

pub mod identity;
pub mod scheduler;
pub mod snapshot;
pub mod types;

pub use identity::{IdentityResolver, Resolution, Strategy};
pub use scheduler::{DiscoveryScheduler, SchedulerState};
pub use snapshot::build_snapshot;
pub use types::{ClusterInfo, DiscoveryResult, NodeInfo, NodeStatus, UNKNOWN};

use crate::k8s::ClusterQuery;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;

pub struct DiscoveryService {
    query: Arc<dyn ClusterQuery>,
    cluster_name: Option<String>,
}

impl DiscoveryService {
    /// An empty `cluster_name` is the same as none.
    pub fn new(query: Arc<dyn ClusterQuery>, cluster_name: Option<String>) -> Self {
        Self {
            query,
            cluster_name: cluster_name.filter(|n| !n.is_empty()),
        }
    }

    /// Fails only when the node listing fails.
    pub async fn discover(&self) -> Result<DiscoveryResult> {
        let cluster_info = IdentityResolver::new(self.query.as_ref(), self.cluster_name.as_deref())
            .resolve()
            .await;

        let listing_started = Instant::now();
        let nodes = self.query.list_nodes().await?;

        Ok(build_snapshot(&nodes, cluster_info, listing_started))
    }
}
