//! Delivery of discovery results to their sinks.
//!
//! Every sink is attempted once per cycle, in order, regardless of how the
//! others fared. Failures are logged here and never propagate to the cycle.

pub mod local;
pub mod remote;

use crate::config::CollectorConfig;
use crate::discovery::DiscoveryResult;
use crate::Result;
use async_trait::async_trait;
use tracing::{debug, error};

pub use local::LocalSink;
pub use remote::RemoteSink;

#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, result: &DiscoveryResult) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub delivered: usize,
    pub failed: usize,
}

pub struct Reporter {
    sinks: Vec<Box<dyn Sink>>,
}

impl Reporter {
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { sinks }
    }

    /// Stdout always; the collector only when an endpoint is configured.
    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        let mut sinks: Vec<Box<dyn Sink>> = vec![Box::new(LocalSink::stdout())];

        match RemoteSink::from_config(config)? {
            Some(remote) => sinks.push(Box::new(remote)),
            None => debug!("No collector endpoint configured, remote delivery disabled"),
        }

        Ok(Self::new(sinks))
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub async fn report(&self, result: &DiscoveryResult) -> ReportSummary {
        let mut summary = ReportSummary::default();

        for sink in &self.sinks {
            match sink.deliver(result).await {
                Ok(()) => summary.delivered += 1,
                Err(e) => {
                    error!(sink = sink.name(), "Failed to deliver discovery result: {}", e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
