use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Kubernetes error: {0}")]
    KubernetesError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to deliver discovery result to {endpoint}: {reason}")]
    DeliveryFailed { endpoint: String, reason: String },

    #[error("Collector {endpoint} returned non-success status: {status}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScoutError>;
