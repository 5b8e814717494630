pub mod client;
pub mod port;

pub use client::K8sClient;
pub use port::ClusterQuery;
