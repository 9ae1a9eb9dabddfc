// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for dispatch integration testing.
//!
//! `TestHarness` assembles a temp SQLite message store, a [`MockSender`] and a
//! config tuned for tests (short poll interval, no store retry delay). The
//! temp directory lives as long as the harness.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use herald_config::HeraldConfig;
use herald_config::model::{DispatchConfig, StorageConfig};
use herald_core::{HeraldError, Message, MessageId, MessageStatus, StorageAdapter};
use herald_storage::SqliteStorage;

use crate::mock_sender::{MockReply, MockSender};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<MockReply>,
    fallback: MockReply,
    dispatch: DispatchConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            fallback: MockReply::Deliver(None),
            dispatch: DispatchConfig {
                poll_interval_secs: 1,
                store_retry_delay_ms: 0,
                ..DispatchConfig::default()
            },
        }
    }

    /// Script the first replies of the mock sender.
    pub fn with_replies(mut self, replies: Vec<MockReply>) -> Self {
        self.replies = replies;
        self
    }

    /// Reply used once the script runs out.
    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Adjust the dispatch settings.
    pub fn with_dispatch(mut self, tweak: impl FnOnce(&mut DispatchConfig)) -> Self {
        tweak(&mut self.dispatch);
        self
    }

    /// Create the temp database and wire everything together.
    pub async fn build(self) -> Result<TestHarness, HeraldError> {
        let temp_dir = tempfile::TempDir::new().map_err(HeraldError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let storage = Arc::new(SqliteStorage::new(storage_config.clone()));
        storage.initialize().await?;

        let sender = MockSender::with_replies(self.replies);
        sender.set_fallback(self.fallback).await;

        let config = HeraldConfig {
            storage: storage_config,
            dispatch: self.dispatch,
            ..HeraldConfig::default()
        };

        Ok(TestHarness {
            storage,
            sender: Arc::new(sender),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A temp message store plus a mock sender.
pub struct TestHarness {
    /// SQLite store (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// The scripted sender.
    pub sender: Arc<MockSender>,
    /// Configuration matching the temp store.
    pub config: HeraldConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default settings and an always-accepting sender.
    pub async fn new() -> Result<Self, HeraldError> {
        Self::builder().build().await
    }

    /// Fixed reference time; `message_at` offsets are relative to it.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// A pending message created `offset_secs` after [`TestHarness::epoch`].
    pub fn message_at(recipient: Option<&str>, payload: &str, offset_secs: i64) -> Message {
        Message::with_created_at(
            recipient.map(str::to_string),
            payload,
            Self::epoch() + chrono::Duration::seconds(offset_secs),
        )
    }

    /// Insert messages into the temp store.
    pub async fn insert(&self, messages: &[Message]) -> Result<(), HeraldError> {
        self.storage.insert_messages(messages).await
    }

    /// Insert `count` pending messages for one recipient, one second apart.
    pub async fn insert_pending(&self, count: usize) -> Result<Vec<Message>, HeraldError> {
        let messages: Vec<Message> = (0..count)
            .map(|i| Self::message_at(Some("+905551111111"), &format!("message {i}"), i as i64))
            .collect();
        self.insert(&messages).await?;
        Ok(messages)
    }

    /// Current state of one message.
    pub async fn get(&self, id: &MessageId) -> Result<Message, HeraldError> {
        self.storage
            .get_message(id)
            .await?
            .ok_or_else(|| HeraldError::NotFound(id.to_string()))
    }

    /// Number of messages in `status`.
    pub async fn count(&self, status: MessageStatus) -> Result<u64, HeraldError> {
        self.storage.count_by_status(&[status]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_starts_with_empty_store() {
        let harness = TestHarness::new().await.unwrap();
        for status in MessageStatus::ALL {
            assert_eq!(harness.count(status).await.unwrap(), 0);
        }
        assert_eq!(harness.config.dispatch.poll_interval_secs, 1);
    }

    #[tokio::test]
    async fn insert_pending_creates_ordered_messages() {
        let harness = TestHarness::new().await.unwrap();
        let inserted = harness.insert_pending(3).await.unwrap();
        assert_eq!(harness.count(MessageStatus::Pending).await.unwrap(), 3);

        let due = harness
            .storage
            .list_due(&MessageStatus::DUE, None)
            .await
            .unwrap();
        let ids: Vec<_> = due.into_iter().map(|m| m.id).collect();
        let expected: Vec<_> = inserted.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn builder_overrides_dispatch_settings() {
        let harness = TestHarness::builder()
            .with_dispatch(|d| d.batch_size = 7)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.config.dispatch.batch_size, 7);
    }
}
