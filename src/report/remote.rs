//! Collector endpoint delivery over HTTP.

use crate::config::CollectorConfig;
use crate::discovery::DiscoveryResult;
use crate::report::Sink;
use crate::{Result, ScoutError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::info;

pub struct RemoteSink {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl RemoteSink {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
        insecure_skip_verify: bool,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()
            .map_err(|e| ScoutError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// `None` when no endpoint is configured.
    pub fn from_config(config: &CollectorConfig) -> Result<Option<Self>> {
        if config.api_endpoint.is_empty() {
            return Ok(None);
        }

        Self::new(
            config.api_endpoint.clone(),
            Some(config.token.clone()),
            config.timeout(),
            config.insecure_skip_verify,
        )
        .map(Some)
    }

    fn failure(&self, e: reqwest::Error) -> ScoutError {
        let reason = if e.is_timeout() {
            format!("request timed out: {}", e)
        } else {
            e.to_string()
        };
        ScoutError::DeliveryFailed {
            endpoint: self.endpoint.clone(),
            reason,
        }
    }
}

#[async_trait]
impl Sink for RemoteSink {
    fn name(&self) -> &str {
        "collector"
    }

    async fn deliver(&self, result: &DiscoveryResult) -> Result<()> {
        let body = serde_json::to_vec(result)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.failure(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::UnexpectedStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        info!(
            status_code = status.as_u16(),
            endpoint = %self.endpoint,
            "Discovery result sent to collector"
        );

        Ok(())
    }
}
