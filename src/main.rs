use anyhow::{Context, Result};
use clap::Parser;
use kubescout::cli::Cli;
use kubescout::config::Config;
use kubescout::discovery::{DiscoveryScheduler, DiscoveryService};
use kubescout::k8s::K8sClient;
use kubescout::logging;
use kubescout::report::Reporter;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            process::exit(1);
        }
    };
    cli.apply(&mut config);

    if let Err(e) = logging::init(&config.log, cli.verbose) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    info!("Starting kubescout v{}", kubescout::VERSION);
    info!(
        token_configured = !config.collector.token.is_empty(),
        endpoint_configured = !config.collector.api_endpoint.is_empty(),
        cluster_name_configured = config.cluster_name_override().is_some(),
        discovery_interval = ?config.interval(),
        "Configuration loaded"
    );

    if let Err(e) = run(config, cli.once).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(config: Config, once: bool) -> Result<()> {
    let client = K8sClient::connect(config.kubeconfig.as_deref())
        .await
        .context("Failed to create Kubernetes client")?;

    let service = DiscoveryService::new(
        Arc::new(client),
        config.cluster_name_override().map(str::to_string),
    );
    let reporter = Reporter::from_config(&config.collector)?;
    let scheduler = DiscoveryScheduler::new(service, reporter, config.interval());

    if once {
        scheduler
            .run_once()
            .await
            .context("Discovery cycle failed")?;
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signals = listen_for_signals();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if shutdown_on_signals(signals, cancel).await {
                warn!("Second shutdown signal received, exiting immediately");
                process::exit(130);
            }
        }
    });

    scheduler.run(cancel).await;

    info!("kubescout stopped");
    Ok(())
}

/// Forwards every SIGINT/SIGTERM for as long as the receiver lives.
fn listen_for_signals() -> mpsc::Receiver<&'static str> {
    let (tx, rx) = mpsc::channel(2);

    let ctrl_c_tx = tx.clone();
    tokio::spawn(async move {
        loop {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                return;
            }
            if ctrl_c_tx.send("SIGINT").await.is_err() {
                return;
            }
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                return;
            }
        };
        while sigterm.recv().await.is_some() {
            if tx.send("SIGTERM").await.is_err() {
                return;
            }
        }
    });

    #[cfg(not(unix))]
    drop(tx);

    rx
}

/// The first signal cancels gracefully. Returns `true` if a second one
/// arrives before the process has exited.
async fn shutdown_on_signals(
    mut signals: mpsc::Receiver<&'static str>,
    cancel: CancellationToken,
) -> bool {
    let Some(first) = signals.recv().await else {
        return false;
    };
    info!(signal = first, "Shutting down after the current cycle");
    cancel.cancel();

    signals.recv().await.is_some()
}
