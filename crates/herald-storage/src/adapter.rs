// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use herald_config::model::StorageConfig;
use herald_core::{
    AdapterType, ClaimRequest, DeliveryOutcome, HealthStatus, HeraldError, Message, MessageId,
    MessageStatus, PluginAdapter, StorageAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed message store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules. The
/// database is opened on the first call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Path of the database file this store was configured with.
    pub fn database_path(&self) -> &str {
        &self.config.database_path
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, HeraldError> {
        self.db
            .get()
            .ok_or_else(|| HeraldError::storage("storage not initialized, call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        let Ok(db) = self.database() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        if self.db.get().is_some() {
            self.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), HeraldError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| HeraldError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), HeraldError> {
        self.database()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn insert_messages(&self, messages: &[Message]) -> Result<(), HeraldError> {
        queries::messages::insert_messages(self.database()?, messages).await
    }

    async fn get_message(&self, id: &MessageId) -> Result<Option<Message>, HeraldError> {
        queries::messages::get_message(self.database()?, id).await
    }

    async fn list_due(
        &self,
        statuses: &[MessageStatus],
        limit: Option<u32>,
    ) -> Result<Vec<Message>, HeraldError> {
        queries::messages::list_due(self.database()?, statuses, limit).await
    }

    async fn list_by_status(
        &self,
        status: MessageStatus,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, HeraldError> {
        queries::messages::list_by_status(self.database()?, status, limit).await
    }

    async fn list_by_recipient(
        &self,
        recipient: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, HeraldError> {
        queries::messages::list_by_recipient(self.database()?, recipient, limit).await
    }

    async fn count_by_status(&self, statuses: &[MessageStatus]) -> Result<u64, HeraldError> {
        queries::messages::count_by_status(self.database()?, statuses).await
    }

    async fn claim_due(&self, request: &ClaimRequest) -> Result<Vec<Message>, HeraldError> {
        queries::claims::claim_due(self.database()?, request).await
    }

    async fn record_outcome(
        &self,
        id: &MessageId,
        worker_id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<(), HeraldError> {
        queries::claims::record_outcome(self.database()?, id, worker_id, outcome).await
    }

    async fn renew_claim(&self, id: &MessageId, worker_id: &str) -> Result<bool, HeraldError> {
        queries::claims::renew_claim(self.database()?, id, worker_id).await
    }

    async fn release_claim(&self, id: &MessageId, worker_id: &str) -> Result<bool, HeraldError> {
        queries::claims::release_claim(self.database()?, id, worker_id).await
    }

    async fn release_worker_claims(&self, worker_id: &str) -> Result<u64, HeraldError> {
        queries::claims::release_worker_claims(self.database()?, worker_id).await
    }

    async fn recover_stale_claims(&self, lease: Duration) -> Result<u64, HeraldError> {
        queries::claims::recover_stale_claims(self.database()?, lease).await
    }

    async fn requeue(&self, id: &MessageId) -> Result<bool, HeraldError> {
        queries::claims::requeue(self.database()?, id).await
    }
}
