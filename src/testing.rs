//! In-memory fakes shared by the unit tests.

use crate::discovery::DiscoveryResult;
use crate::k8s::ClusterQuery;
use crate::report::Sink;
use crate::{Result, ScoutError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, Node, NodeAddress, NodeCondition, NodeSpec, NodeStatus,
    NodeSystemInfo,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListNodes,
    GetConfigMap(String, String),
    ListConfigMaps(String),
    GetNamespace(String),
    ServerVersion,
}

/// Scripted cluster. Missing objects answer with a not-found error.
pub struct FakeCluster {
    nodes: Option<Vec<Node>>,
    config_maps: Vec<(String, ConfigMap)>,
    namespaces: BTreeMap<String, Namespace>,
    version: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self {
            nodes: Some(Vec::new()),
            config_maps: Vec::new(),
            namespaces: BTreeMap::new(),
            version: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    pub fn failing_node_list(mut self) -> Self {
        self.nodes = None;
        self
    }

    pub fn with_config_map(mut self, namespace: &str, config_map: ConfigMap) -> Self {
        self.config_maps.push((namespace.to_string(), config_map));
        self
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        let name = namespace.metadata.name.clone().unwrap_or_default();
        self.namespaces.insert(name, namespace);
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn not_found(what: String) -> ScoutError {
    ScoutError::KubernetesError(format!("{} not found", what))
}

#[async_trait]
impl ClusterQuery for FakeCluster {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.record(Call::ListNodes);
        self.nodes
            .clone()
            .ok_or_else(|| ScoutError::KubernetesError("connection refused".to_string()))
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap> {
        self.record(Call::GetConfigMap(namespace.to_string(), name.to_string()));
        self.config_maps
            .iter()
            .find(|(ns, cm)| ns == namespace && cm.metadata.name.as_deref() == Some(name))
            .map(|(_, cm)| cm.clone())
            .ok_or_else(|| not_found(format!("configmap {}/{}", namespace, name)))
    }

    async fn list_config_maps(&self, namespace: &str) -> Result<Vec<ConfigMap>> {
        self.record(Call::ListConfigMaps(namespace.to_string()));
        Ok(self
            .config_maps
            .iter()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, cm)| cm.clone())
            .collect())
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace> {
        self.record(Call::GetNamespace(name.to_string()));
        self.namespaces
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(format!("namespace {}", name)))
    }

    async fn server_version(&self) -> Result<String> {
        self.record(Call::ServerVersion);
        self.version
            .clone()
            .ok_or_else(|| ScoutError::KubernetesError("version endpoint unavailable".to_string()))
    }
}

fn string_map(pairs: &[(&str, &str)]) -> Option<BTreeMap<String, String>> {
    if pairs.is_empty() {
        return None;
    }
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

/// A node with the given `(type, status)` conditions.
pub fn node(name: &str, conditions: &[(&str, &str)]) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(NodeSpec::default()),
        status: Some(NodeStatus {
            conditions: Some(
                conditions
                    .iter()
                    .map(|(type_, status)| NodeCondition {
                        type_: type_.to_string(),
                        status: status.to_string(),
                        ..Default::default()
                    })
                    .collect(),
            ),
            node_info: Some(NodeSystemInfo {
                kubelet_version: "v1.31.2".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
    }
}

pub fn with_addresses(mut node: Node, addresses: &[(&str, &str)]) -> Node {
    let status = node.status.get_or_insert_with(Default::default);
    status.addresses = Some(
        addresses
            .iter()
            .map(|(type_, address)| NodeAddress {
                type_: type_.to_string(),
                address: address.to_string(),
            })
            .collect(),
    );
    node
}

pub fn with_labels(mut node: Node, labels: &[(&str, &str)]) -> Node {
    node.metadata.labels = string_map(labels);
    node
}

pub fn with_provider_id(mut node: Node, provider_id: &str) -> Node {
    let spec = node.spec.get_or_insert_with(Default::default);
    spec.provider_id = Some(provider_id.to_string());
    node
}

pub fn config_map(name: &str, data: &[(&str, &str)]) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        data: string_map(data),
        ..Default::default()
    }
}

pub fn namespace(name: &str, labels: &[(&str, &str)]) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: string_map(labels),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// `Write` handle whose bytes stay inspectable after being moved into a sink.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sink that counts completed deliveries. Can be made to fail or to take a
/// while before completing.
#[derive(Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<AtomicUsize>,
    fail: bool,
    delay: Duration,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, _result: &DiscoveryResult) -> Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.delivered.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ScoutError::UnexpectedStatus {
                endpoint: "http://collector.invalid".to_string(),
                status: 500,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

/// Local collector answering every POST with `status` after `delay`.
/// Requests are captured on arrival, before the delay.
pub async fn spawn_collector(
    status: u16,
    delay: Duration,
) -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
    use axum::body::Bytes;
    use axum::http::{header, HeaderMap, StatusCode};

    let captured = Arc::new(Mutex::new(Vec::new()));
    let requests = captured.clone();

    let app = axum::Router::new().route(
        "/discovery",
        axum::routing::post(move |headers: HeaderMap, body: Bytes| {
            let requests = requests.clone();
            async move {
                let header_value = |name: header::HeaderName| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                let request = CapturedRequest {
                    content_type: header_value(header::CONTENT_TYPE),
                    authorization: header_value(header::AUTHORIZATION),
                    body: body.to_vec(),
                };
                requests.lock().unwrap().push(request);
                tokio::time::sleep(delay).await;
                StatusCode::from_u16(status).unwrap()
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/discovery", addr), captured)
}
