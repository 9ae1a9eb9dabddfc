// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Start/stop switch around the dispatch loop.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::worker::DispatchWorker;

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns at most one running dispatch loop.
///
/// `start` and `stop` are idempotent. The loop also stops when the parent
/// shutdown token fires.
pub struct DispatchController {
    worker: Arc<DispatchWorker>,
    shutdown: CancellationToken,
    running: Mutex<Option<Running>>,
}

impl DispatchController {
    pub fn new(worker: Arc<DispatchWorker>, shutdown: CancellationToken) -> Self {
        Self {
            worker,
            shutdown,
            running: Mutex::new(None),
        }
    }

    /// Spawn the dispatch loop. Returns `false` if it was already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return false;
        }

        let cancel = self.shutdown.child_token();
        let worker = Arc::clone(&self.worker);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { worker.run(token).await });
        *running = Some(Running { cancel, handle });
        info!("message sending started");
        true
    }

    /// Stop the loop and wait for it to release its claims.
    ///
    /// Returns `false` if it was not running.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.running.lock().await.take() else {
            return false;
        };
        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            warn!(error = %e, "dispatch loop ended abnormally");
        }
        info!("message sending stopped");
        true
    }

    /// Whether the loop is currently running.
    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }
}
