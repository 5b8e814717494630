use crate::k8s::ClusterQuery;
use crate::{Result, ScoutError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Node};
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::fmt::Display;
use std::future::Future;
use std::path::Path;
use tracing::{debug, info};

pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    /// In-cluster service account first, then the default kubeconfig
    /// (`$KUBECONFIG` or `~/.kube/config`).
    pub async fn try_default() -> Result<Self> {
        debug!("Initializing Kubernetes client");

        let options = KubeConfigOptions::default();
        let config =
            in_cluster_first(Config::incluster(), || Config::from_kubeconfig(&options)).await?;

        let client = Client::try_from(config).map_err(|e| {
            ScoutError::KubernetesError(format!("Failed to create K8s client: {}", e))
        })?;

        info!("Successfully connected to Kubernetes cluster");

        Ok(Self { client })
    }

    pub async fn from_kubeconfig(path: &Path) -> Result<Self> {
        debug!("Initializing Kubernetes client from {}", path.display());

        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
            ScoutError::KubernetesError(format!(
                "Failed to read kubeconfig {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                ScoutError::KubernetesError(format!("Invalid kubeconfig {}: {}", path.display(), e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            ScoutError::KubernetesError(format!("Failed to create K8s client: {}", e))
        })?;

        info!("Successfully connected to Kubernetes cluster");

        Ok(Self { client })
    }

    /// Uses the explicit kubeconfig when given, otherwise the default chain.
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self> {
        match kubeconfig {
            Some(path) => Self::from_kubeconfig(path).await,
            None => Self::try_default().await,
        }
    }

    fn config_maps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Takes the in-cluster result when it succeeded; only otherwise is the
/// kubeconfig source consulted.
async fn in_cluster_first<T, E1, E2, F, Fut>(
    in_cluster: std::result::Result<T, E1>,
    kubeconfig: F,
) -> Result<T>
where
    E1: Display,
    E2: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E2>>,
{
    let in_cluster_err = match in_cluster {
        Ok(config) => {
            debug!("Using in-cluster configuration");
            return Ok(config);
        }
        Err(e) => e,
    };
    debug!("In-cluster configuration unavailable: {}", in_cluster_err);

    kubeconfig().await.map_err(|e| {
        ScoutError::KubernetesError(format!(
            "No usable cluster configuration (in-cluster: {}; kubeconfig: {})",
            in_cluster_err, e
        ))
    })
}

#[async_trait]
impl ClusterQuery for K8sClient {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let nodes: Api<Node> = Api::all(self.client.clone());

        let node_list = nodes
            .list(&ListParams::default())
            .await
            .map_err(|e| ScoutError::KubernetesError(format!("Failed to list nodes: {}", e)))?;

        Ok(node_list.items)
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap> {
        self.config_maps(namespace).get(name).await.map_err(|e| {
            ScoutError::KubernetesError(format!(
                "Failed to get config map {}/{}: {}",
                namespace, name, e
            ))
        })
    }

    async fn list_config_maps(&self, namespace: &str) -> Result<Vec<ConfigMap>> {
        let list = self
            .config_maps(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| {
                ScoutError::KubernetesError(format!(
                    "Failed to list config maps in {}: {}",
                    namespace, e
                ))
            })?;

        Ok(list.items)
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());

        namespaces.get(name).await.map_err(|e| {
            ScoutError::KubernetesError(format!("Failed to get namespace {}: {}", name, e))
        })
    }

    async fn server_version(&self) -> Result<String> {
        let info = self.client.apiserver_version().await.map_err(|e| {
            ScoutError::KubernetesError(format!("Failed to query server version: {}", e))
        })?;

        Ok(info.git_version)
    }
}
