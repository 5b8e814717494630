//! Cluster identity resolution
//!
//! Kubernetes has no first-class "cluster name", so it is searched for in a
//! fixed order across objects that conventionally carry it. Each strategy is
//! an independent lookup returning a [`Resolution`]; the first `Found` wins
//! and nothing after it is queried. Strategy errors never escape: they are
//! logged and treated as `NotFound`.

use crate::discovery::types::{ClusterInfo, UNKNOWN};
use crate::k8s::ClusterQuery;
use tracing::debug;

pub const SYSTEM_NAMESPACE: &str = "kube-system";
pub const PUBLIC_NAMESPACE: &str = "kube-public";
pub const BOOTSTRAP_CONFIG_MAP: &str = "kubeadm-config";
pub const BOOTSTRAP_CONFIG_KEY: &str = "ClusterConfiguration";
pub const CLUSTER_INFO_CONFIG_MAP: &str = "cluster-info";

/// Name used when the cluster is evidently real but carries no name.
pub const GENERIC_CLUSTER_NAME: &str = "kubernetes-cluster";

const CLUSTER_NAME_KEY: &str = "cluster-name";
const CLUSTER_NAME_LABEL: &str = "kubernetes.io/cluster-name";

/// Node labels checked in order by [`Strategy::NodeLabels`].
pub const NODE_CLUSTER_LABELS: [&str; 3] = [
    CLUSTER_NAME_LABEL,
    "cluster.x-k8s.io/cluster-name",
    CLUSTER_NAME_KEY,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    NotFound,
}

impl Resolution {
    /// `Found` only for non-empty names.
    fn from_candidate(candidate: Option<&String>) -> Self {
        match candidate {
            Some(name) if !name.is_empty() => Resolution::Found(name.clone()),
            _ => Resolution::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    BootstrapConfig,
    PublicClusterInfo,
    SystemConfigMapScan,
    NodeLabels,
    SystemNamespaceLabel,
}

impl Strategy {
    /// Evaluation order when no override is configured.
    pub const CHAIN: [Strategy; 5] = [
        Strategy::BootstrapConfig,
        Strategy::PublicClusterInfo,
        Strategy::SystemConfigMapScan,
        Strategy::NodeLabels,
        Strategy::SystemNamespaceLabel,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Strategy::BootstrapConfig => "bootstrap-config",
            Strategy::PublicClusterInfo => "public-cluster-info",
            Strategy::SystemConfigMapScan => "system-configmap-scan",
            Strategy::NodeLabels => "node-labels",
            Strategy::SystemNamespaceLabel => "system-namespace-label",
        }
    }

    pub async fn attempt(&self, query: &dyn ClusterQuery) -> Resolution {
        match self {
            Strategy::BootstrapConfig => from_bootstrap_config(query).await,
            Strategy::PublicClusterInfo => from_public_cluster_info(query).await,
            Strategy::SystemConfigMapScan => from_system_config_maps(query).await,
            Strategy::NodeLabels => from_node_labels(query).await,
            Strategy::SystemNamespaceLabel => from_system_namespace(query).await,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolves [`ClusterInfo`] for one cycle. Never fails.
pub struct IdentityResolver<'a> {
    query: &'a dyn ClusterQuery,
    cluster_name: Option<&'a str>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(query: &'a dyn ClusterQuery, cluster_name: Option<&'a str>) -> Self {
        Self {
            query,
            cluster_name,
        }
    }

    pub async fn resolve(&self) -> ClusterInfo {
        ClusterInfo {
            name: self.resolve_name().await,
            version: self.resolve_version().await,
        }
    }

    pub async fn resolve_name(&self) -> String {
        if let Some(name) = self.cluster_name.filter(|n| !n.is_empty()) {
            debug!(cluster_name = %name, "Using configured cluster name");
            return name.to_string();
        }

        for strategy in Strategy::CHAIN {
            if let Resolution::Found(name) = strategy.attempt(self.query).await {
                debug!(cluster_name = %name, strategy = %strategy, "Resolved cluster name");
                return name;
            }
            debug!(strategy = %strategy, "Cluster name strategy found nothing");
        }

        UNKNOWN.to_string()
    }

    pub async fn resolve_version(&self) -> String {
        match self.query.server_version().await {
            Ok(version) => version,
            Err(e) => {
                debug!("Server version unavailable: {}", e);
                UNKNOWN.to_string()
            }
        }
    }
}

pub async fn from_bootstrap_config(query: &dyn ClusterQuery) -> Resolution {
    let config_map = match query
        .get_config_map(SYSTEM_NAMESPACE, BOOTSTRAP_CONFIG_MAP)
        .await
    {
        Ok(cm) => cm,
        Err(e) => {
            debug!("{}", e);
            return Resolution::NotFound;
        }
    };

    config_map
        .data
        .as_ref()
        .and_then(|data| data.get(BOOTSTRAP_CONFIG_KEY))
        .and_then(|text| scan_cluster_name(text))
        .map(Resolution::Found)
        .unwrap_or(Resolution::NotFound)
}

/// First non-empty `clusterName:` value in a kubeadm `ClusterConfiguration`,
/// with surrounding whitespace and quotes removed.
pub fn scan_cluster_name(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let (_, value) = line.split_once("clusterName:")?;
        let name = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
        (!name.is_empty()).then(|| name.to_string())
    })
}

pub async fn from_public_cluster_info(query: &dyn ClusterQuery) -> Resolution {
    let config_map = match query
        .get_config_map(PUBLIC_NAMESPACE, CLUSTER_INFO_CONFIG_MAP)
        .await
    {
        Ok(cm) => cm,
        Err(e) => {
            debug!("{}", e);
            return Resolution::NotFound;
        }
    };

    let metadata = &config_map.metadata;
    match Resolution::from_candidate(
        metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(CLUSTER_NAME_LABEL)),
    ) {
        Resolution::NotFound => Resolution::from_candidate(
            metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get(CLUSTER_NAME_KEY)),
        ),
        found => found,
    }
}

pub async fn from_system_config_maps(query: &dyn ClusterQuery) -> Resolution {
    let config_maps = match query.list_config_maps(SYSTEM_NAMESPACE).await {
        Ok(list) => list,
        Err(e) => {
            debug!("{}", e);
            return Resolution::NotFound;
        }
    };

    config_maps
        .iter()
        .filter(|cm| {
            cm.metadata
                .name
                .as_deref()
                .is_some_and(|name| name.contains("cluster"))
        })
        .find_map(|cm| {
            cm.data
                .as_ref()?
                .get(CLUSTER_NAME_KEY)
                .filter(|name| !name.is_empty())
                .cloned()
        })
        .map(Resolution::Found)
        .unwrap_or(Resolution::NotFound)
}

pub async fn from_node_labels(query: &dyn ClusterQuery) -> Resolution {
    let nodes = match query.list_nodes().await {
        Ok(nodes) => nodes,
        Err(e) => {
            debug!("{}", e);
            return Resolution::NotFound;
        }
    };

    let Some(first) = nodes.first() else {
        return Resolution::NotFound;
    };

    if let Some(labels) = first.metadata.labels.as_ref() {
        for key in NODE_CLUSTER_LABELS {
            if let Resolution::Found(name) = Resolution::from_candidate(labels.get(key)) {
                return Resolution::Found(name);
            }
        }
    }

    // aws:///us-west-2a/i-0abc, gce://project/zone/instance
    let provider_id = first
        .spec
        .as_ref()
        .and_then(|s| s.provider_id.as_deref())
        .unwrap_or("");
    if provider_id.contains("://") {
        return Resolution::Found(GENERIC_CLUSTER_NAME.to_string());
    }

    Resolution::NotFound
}

pub async fn from_system_namespace(query: &dyn ClusterQuery) -> Resolution {
    match query.get_namespace(SYSTEM_NAMESPACE).await {
        Ok(ns) => match Resolution::from_candidate(
            ns.metadata
                .labels
                .as_ref()
                .and_then(|l| l.get(CLUSTER_NAME_KEY)),
        ) {
            Resolution::NotFound => Resolution::Found(GENERIC_CLUSTER_NAME.to_string()),
            found => found,
        },
        Err(e) => {
            debug!("{}", e);
            Resolution::NotFound
        }
    }
}
