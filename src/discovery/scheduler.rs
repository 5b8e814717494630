//! Drives discovery cycles: one immediately, then one per interval, until
//! cancelled. Cycles never overlap; the next wait starts only after the
//! previous cycle, reporting included, has finished.

use crate::discovery::{DiscoveryResult, DiscoveryService};
use crate::report::Reporter;
use crate::Result;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

pub struct DiscoveryScheduler {
    service: DiscoveryService,
    reporter: Reporter,
    interval: Duration,
    state: watch::Sender<SchedulerState>,
}

impl DiscoveryScheduler {
    pub fn new(service: DiscoveryService, reporter: Reporter, interval: Duration) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            service,
            reporter,
            interval,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Runs a single cycle. Delivery failures are logged by the reporter and
    /// do not turn into an error here; only a failed node listing does.
    pub async fn run_once(&self) -> Result<DiscoveryResult> {
        self.state.send_replace(SchedulerState::Running);

        let outcome = self.service.discover().await;
        match &outcome {
            Ok(result) => {
                let summary = self.reporter.report(result).await;
                info!(
                    cluster_name = %result.cluster_info.name,
                    cluster_version = %result.cluster_info.version,
                    node_count = result.node_count,
                    duration = %result.duration,
                    delivered = summary.delivered,
                    failed = summary.failed,
                    "Discovery completed"
                );
            }
            Err(e) => error!("Failed to discover nodes: {}", e),
        }

        self.state.send_replace(SchedulerState::Idle);
        outcome
    }

    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval = ?self.interval, "Starting discovery loop");

        while !cancel.is_cancelled() {
            // Already logged.
            let _ = self.run_once().await;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Shutdown signal received, stopping discovery");
    }
}
