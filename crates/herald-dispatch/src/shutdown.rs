// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the dispatch loop monitors. In-flight sends
//! finish, unsent claims are released, then the process exits.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::controller::DispatchController;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
            let _ = ctrl_c.await;
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}

/// Stop the dispatch loop, waiting up to `grace` for in-flight sends.
///
/// Returns `false` when the grace period ran out first. Claims left behind
/// in that case are recovered by the next worker once their lease expires.
pub async fn drain(controller: &DispatchController, grace: Duration) -> bool {
    match tokio::time::timeout(grace, controller.stop()).await {
        Ok(_) => {
            info!("dispatch loop drained");
            true
        }
        Err(_) => {
            warn!(
                grace_secs = grace.as_secs(),
                "grace period elapsed before the dispatch loop drained"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use herald_test_utils::{MockReply, TestHarness};

    use crate::worker::DispatchWorker;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }

    #[tokio::test]
    async fn drain_idle_controller_completes() {
        let harness = TestHarness::new().await.unwrap();
        let worker = DispatchWorker::new(
            harness.storage.clone(),
            harness.sender.clone(),
            harness.config.dispatch.clone(),
        );
        let ctl = DispatchController::new(Arc::new(worker), CancellationToken::new());
        assert!(drain(&ctl, Duration::from_millis(100)).await);
    }

    #[tokio::test]
    async fn drain_times_out_on_slow_send() {
        let harness = TestHarness::builder()
            .with_fallback(MockReply::Delay(Duration::from_secs(5)))
            .build()
            .await
            .unwrap();
        harness.insert_pending(1).await.unwrap();
        let worker = DispatchWorker::new(
            harness.storage.clone(),
            harness.sender.clone(),
            harness.config.dispatch.clone(),
        );
        let ctl = DispatchController::new(Arc::new(worker), CancellationToken::new());
        ctl.start().await;
        for _ in 0..100 {
            if harness.sender.send_count().await > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!drain(&ctl, Duration::from_millis(50)).await);
    }
}
