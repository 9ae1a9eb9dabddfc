// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatch worker: one polling loop, bounded concurrent delivery.
//!
//! Each cycle recovers stale claims, claims the oldest due messages,
//! delivers them with at most `max_in_flight` sends in flight and records
//! every outcome under the claim. Messages whose send never started when
//! cancellation is observed are released unsent.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use herald_config::model::DispatchConfig;
use herald_core::types::now_millis;
use herald_core::{
    ClaimRequest, DeliveryOutcome, HeraldError, Message, SenderAdapter, StorageAdapter,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::recording;
use crate::validate::validate_message;

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Orphaned claims released before claiming.
    pub recovered: u64,
    pub claimed: usize,
    pub sent: usize,
    pub failed: usize,
    pub malformed: usize,
    pub deferred: usize,
    /// Claimed but released unsent because of shutdown.
    pub released: usize,
    /// Claims taken back by lease recovery before the send started.
    pub lost: usize,
    /// Outcomes that could not be written back.
    pub store_errors: usize,
}

impl CycleReport {
    fn tally(&mut self, processed: &Processed) {
        match processed {
            Processed::Recorded(DeliveryOutcome::Delivered { .. }) => self.sent += 1,
            Processed::Recorded(DeliveryOutcome::Rejected { .. }) => self.failed += 1,
            Processed::Recorded(DeliveryOutcome::Malformed { .. }) => self.malformed += 1,
            Processed::Recorded(DeliveryOutcome::Deferred { .. }) => self.deferred += 1,
            Processed::Released => self.released += 1,
            Processed::Lost => self.lost += 1,
            Processed::StoreError => self.store_errors += 1,
        }
    }
}

enum Processed {
    Recorded(DeliveryOutcome),
    Released,
    Lost,
    StoreError,
}

/// Polls the store and delivers due messages through one sender.
pub struct DispatchWorker {
    storage: Arc<dyn StorageAdapter>,
    sender: Arc<dyn SenderAdapter>,
    config: DispatchConfig,
    worker_id: String,
}

impl DispatchWorker {
    /// Create a worker with a fresh, unique claim owner id.
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        sender: Arc<dyn SenderAdapter>,
        config: DispatchConfig,
    ) -> Self {
        let worker_id = format!("worker-{}", uuid::Uuid::new_v4());
        Self {
            storage,
            sender,
            config,
            worker_id,
        }
    }

    /// Identifier recorded as the owner of this worker's claims.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Run one dispatch cycle.
    ///
    /// Only the claim itself can fail the cycle; per-message problems are
    /// counted in the report.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport, HeraldError> {
        let mut report = CycleReport::default();
        if cancel.is_cancelled() {
            return Ok(report);
        }
        let started = Instant::now();

        match self
            .storage
            .recover_stale_claims(self.config.claim_lease())
            .await
        {
            Ok(0) => {}
            Ok(n) => {
                warn!(count = n, "released stale claims");
                report.recovered = n;
            }
            Err(e) => warn!(error = %e, "stale claim recovery failed"),
        }

        let claimed = self
            .storage
            .claim_due(&ClaimRequest {
                worker_id: self.worker_id.clone(),
                limit: self.config.batch_size,
                retry_limit: self.config.retry_limit,
            })
            .await?;
        report.claimed = claimed.len();
        recording::set_claimed(claimed.len());

        if claimed.is_empty() {
            debug!("no due messages");
            recording::record_cycle(started.elapsed());
            return Ok(report);
        }
        debug!(count = claimed.len(), "claimed messages");

        let deliveries: Vec<_> = claimed
            .into_iter()
            .map(|message| self.process(message, cancel))
            .collect();
        let results: Vec<Processed> = futures::stream::iter(deliveries)
            .buffer_unordered(self.config.max_in_flight.max(1))
            .collect()
            .await;
        for processed in &results {
            report.tally(processed);
        }

        recording::record_cycle(started.elapsed());
        Ok(report)
    }

    /// Run cycles until `cancel` fires: one immediately, then one per poll interval.
    ///
    /// On exit every claim still held by this worker is released.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            worker_id = %self.worker_id,
            poll_interval_secs = self.config.poll_interval_secs,
            batch_size = self.config.batch_size,
            "dispatch loop started"
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.run_cycle(&cancel).await {
                Ok(report) if report.claimed > 0 => info!(
                    claimed = report.claimed,
                    sent = report.sent,
                    failed = report.failed,
                    malformed = report.malformed,
                    deferred = report.deferred,
                    released = report.released,
                    lost = report.lost,
                    store_errors = report.store_errors,
                    "dispatch cycle complete"
                ),
                Ok(_) => {}
                Err(e) => error!(error = %e, "dispatch cycle failed"),
            }
        }

        match self.storage.release_worker_claims(&self.worker_id).await {
            Ok(0) => {}
            Ok(n) => info!(count = n, "released claims on shutdown"),
            Err(e) => error!(error = %e, "failed to release claims on shutdown"),
        }
        info!(worker_id = %self.worker_id, "dispatch loop stopped");
    }

    async fn process(&self, message: Message, cancel: &CancellationToken) -> Processed {
        if cancel.is_cancelled() {
            return match self.storage.release_claim(&message.id, &self.worker_id).await {
                Ok(_) => Processed::Released,
                Err(e) => {
                    warn!(id = %message.id, error = %e, "failed to release claim");
                    Processed::StoreError
                }
            };
        }

        // The claim was stamped when the batch was taken; restamp it so a
        // message queued behind slow sends does not look abandoned.
        match self.storage.renew_claim(&message.id, &self.worker_id).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(id = %message.id, "claim lost before send, skipping");
                return Processed::Lost;
            }
            Err(e) => {
                warn!(id = %message.id, error = %e, "failed to renew claim, skipping send");
                return Processed::StoreError;
            }
        }

        let outcome = self.deliver(&message).await;
        match self.record(&message, &outcome).await {
            Ok(()) => {
                recording::record_outcome(&outcome);
                Processed::Recorded(outcome)
            }
            Err(e) => {
                error!(
                    id = %message.id,
                    outcome = outcome.label(),
                    error = %e,
                    "failed to record delivery outcome"
                );
                Processed::StoreError
            }
        }
    }

    async fn deliver(&self, message: &Message) -> DeliveryOutcome {
        let recipient = match validate_message(message, self.config.max_payload_chars) {
            Ok(recipient) => recipient,
            Err(reason) => {
                warn!(id = %message.id, %reason, "message is malformed");
                return DeliveryOutcome::Malformed {
                    reason: reason.to_string(),
                };
            }
        };

        let timeout = self.config.send_timeout();
        let send = self.sender.send(recipient, &message.payload);
        let result = match tokio::time::timeout(timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(HeraldError::Timeout { duration: timeout }),
        };

        match result {
            Ok(receipt) => {
                debug!(
                    id = %message.id,
                    provider_message_id = receipt.provider_message_id.as_deref().unwrap_or(""),
                    "message delivered"
                );
                DeliveryOutcome::Delivered {
                    provider_message_id: receipt.provider_message_id,
                    sent_at: now_millis(),
                }
            }
            Err(e) if e.is_transient() => {
                warn!(id = %message.id, error = %e, "sender unavailable, deferring");
                DeliveryOutcome::Deferred {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                warn!(
                    id = %message.id,
                    attempt = message.attempt_count + 1,
                    error = %e,
                    "delivery rejected"
                );
                DeliveryOutcome::Rejected {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Write an outcome, retrying storage errors.
    ///
    /// Claim and transition errors are not retried: the row is no longer ours.
    async fn record(&self, message: &Message, outcome: &DeliveryOutcome) -> Result<(), HeraldError> {
        let attempts = self.config.store_retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self
                .storage
                .record_outcome(&message.id, &self.worker_id, outcome)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e @ HeraldError::Storage { .. }) if attempt < attempts => {
                    warn!(id = %message.id, attempt, error = %e, "status write failed, retrying");
                    tokio::time::sleep(self.config.store_retry_delay()).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
