// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald serve` command implementation.
//!
//! Opens the store, builds the webhook sender and the dispatch worker, and
//! keeps the dispatch loop running until SIGINT or SIGTERM. On Unix, SIGUSR1
//! starts sending and SIGUSR2 pauses it without stopping the process.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use herald_config::HeraldConfig;
use herald_config::model::PrometheusConfig;
use herald_core::{HeraldError, PluginAdapter, StorageAdapter};
use herald_dispatch::{DispatchController, DispatchWorker, recording, shutdown};
use herald_webhook::WebhookSender;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::commands::open_storage;

/// Runs the `herald serve` command.
pub async fn run_serve(config: HeraldConfig) -> Result<(), HeraldError> {
    info!(
        service = %config.service.name,
        environment = %config.service.environment,
        "herald starting"
    );

    if config.prometheus.enabled {
        install_prometheus(&config.prometheus)?;
    }

    let sender = Arc::new(WebhookSender::new(&config.sender)?);
    info!(url = sender.url(), "webhook sender ready");

    let storage = Arc::new(open_storage(&config).await?);
    info!(path = storage.database_path(), "storage initialized");

    let worker = DispatchWorker::new(storage.clone(), sender.clone(), config.dispatch.clone());
    info!(
        worker_id = worker.worker_id(),
        poll_interval_secs = config.dispatch.poll_interval_secs,
        batch_size = config.dispatch.batch_size,
        "dispatch worker created"
    );

    let cancel = shutdown::install_signal_handler();
    let controller = Arc::new(DispatchController::new(Arc::new(worker), cancel.clone()));

    if config.dispatch.autostart {
        controller.start().await;
    } else {
        info!("dispatch.autostart is off, waiting for a start request");
    }

    #[cfg(unix)]
    tokio::spawn(control_signals(controller.clone(), cancel.clone()));

    cancel.cancelled().await;

    let grace = Duration::from_secs(config.service.shutdown_grace_secs);
    shutdown::drain(&controller, grace).await;

    if let Err(e) = sender.shutdown().await {
        warn!(error = %e, "sender shutdown failed");
    }
    storage.close().await?;

    info!("herald serve shutdown complete");
    Ok(())
}

/// Installs the global metrics recorder with an HTTP scrape listener.
fn install_prometheus(config: &PrometheusConfig) -> Result<(), HeraldError> {
    let addr: SocketAddr = config.listen_address.parse().map_err(|e| {
        HeraldError::Config(format!(
            "invalid prometheus.listen_address `{}`: {e}",
            config.listen_address
        ))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| HeraldError::Internal(format!("failed to install Prometheus exporter: {e}")))?;

    recording::register_metrics();
    info!(%addr, "prometheus exporter listening");
    Ok(())
}

/// SIGUSR1 starts the dispatch loop, SIGUSR2 stops it.
#[cfg(unix)]
async fn control_signals(controller: Arc<DispatchController>, cancel: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut usr1, mut usr2) = match (
        signal(SignalKind::user_defined1()),
        signal(SignalKind::user_defined2()),
    ) {
        (Ok(usr1), Ok(usr2)) => (usr1, usr2),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "failed to install SIGUSR1/SIGUSR2 handlers, start/stop control disabled");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = usr1.recv() => {
                if !controller.start().await {
                    info!("message sending already running");
                }
            }
            _ = usr2.recv() => {
                if !controller.stop().await {
                    info!("message sending already stopped");
                }
            }
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("herald={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
