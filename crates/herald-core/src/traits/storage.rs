// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the persisted message store.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ClaimRequest, DeliveryOutcome, Message, MessageId, MessageStatus};

/// Adapter for the message store.
///
/// The read side is limited to three access patterns: by status ordered by
/// creation time, by status, and by recipient. The write side is the claim
/// protocol used by the dispatch worker: a message is claimed atomically
/// before it is sent and every outcome is written back under that claim.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), HeraldError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), HeraldError>;

    /// Inserts messages in a single transaction.
    async fn insert_messages(&self, messages: &[Message]) -> Result<(), HeraldError>;

    /// Fetches one message by identifier.
    async fn get_message(&self, id: &MessageId) -> Result<Option<Message>, HeraldError>;

    /// Messages in any of `statuses`, oldest `created_at` first.
    async fn list_due(
        &self,
        statuses: &[MessageStatus],
        limit: Option<u32>,
    ) -> Result<Vec<Message>, HeraldError>;

    /// Messages in exactly `status`, oldest `created_at` first.
    async fn list_by_status(
        &self,
        status: MessageStatus,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, HeraldError>;

    /// Messages addressed to `recipient`.
    async fn list_by_recipient(
        &self,
        recipient: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, HeraldError>;

    /// Number of messages in any of `statuses`.
    async fn count_by_status(&self, statuses: &[MessageStatus]) -> Result<u64, HeraldError>;

    /// Atomically claims up to `request.limit` of the oldest eligible messages.
    ///
    /// Claimed failed messages move back to pending (the retry transition).
    async fn claim_due(&self, request: &ClaimRequest) -> Result<Vec<Message>, HeraldError>;

    /// Writes the outcome of a delivery attempt and releases the claim.
    ///
    /// Fails with [`HeraldError::ClaimLost`] when `worker_id` no longer owns the message.
    async fn record_outcome(
        &self,
        id: &MessageId,
        worker_id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<(), HeraldError>;

    /// Restamps the claim on `id` just before a send.
    ///
    /// Returns `false` when `worker_id` no longer holds it, in which case the
    /// message must not be sent.
    async fn renew_claim(&self, id: &MessageId, worker_id: &str) -> Result<bool, HeraldError>;

    /// Releases one claim without changing the message. Returns whether a claim was held.
    async fn release_claim(&self, id: &MessageId, worker_id: &str) -> Result<bool, HeraldError>;

    /// Releases every claim held by `worker_id`. Returns the number released.
    async fn release_worker_claims(&self, worker_id: &str) -> Result<u64, HeraldError>;

    /// Releases claims older than `lease`, left behind by a worker that died.
    async fn recover_stale_claims(&self, lease: Duration) -> Result<u64, HeraldError>;

    /// Puts a failed message back to pending with a fresh retry budget.
    ///
    /// Returns `false` when the message is not failed or is currently claimed.
    async fn requeue(&self, id: &MessageId) -> Result<bool, HeraldError>;
}
