// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot operator commands. Each opens the store, does its work, prints
//! JSON to stdout and closes the store again.

use std::sync::Arc;

use herald_config::HeraldConfig;
use herald_core::{HeraldError, MessageId, MessageStatus, StorageAdapter};
use herald_dispatch::{DispatchWorker, seed_messages};
use herald_storage::SqliteStorage;
use herald_webhook::WebhookSender;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Open and migrate the configured database.
pub async fn open_storage(config: &HeraldConfig) -> Result<SqliteStorage, HeraldError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(storage)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), HeraldError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| HeraldError::Internal(format!("failed to encode output: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Run `work` against an open store, closing it whether or not `work` succeeded.
async fn with_storage<T, F>(config: &HeraldConfig, work: F) -> Result<T, HeraldError>
where
    F: AsyncFnOnce(&SqliteStorage) -> Result<T, HeraldError>,
{
    let storage = open_storage(config).await?;
    let result = work(&storage).await;
    storage.close().await?;
    result
}

/// `herald init`
pub async fn init(config: &HeraldConfig) -> Result<(), HeraldError> {
    with_storage(config, async |storage| {
        info!(path = storage.database_path(), "database ready");
        print_json(&json!({
            "database": storage.database_path(),
            "initialized": true,
        }))
    })
    .await
}

/// `herald run-once`
pub async fn run_once(config: &HeraldConfig) -> Result<(), HeraldError> {
    let sender = Arc::new(WebhookSender::new(&config.sender)?);
    let storage = Arc::new(open_storage(config).await?);
    let worker = DispatchWorker::new(storage.clone(), sender, config.dispatch.clone());

    let result = worker.run_cycle(&CancellationToken::new()).await;
    storage.close().await?;

    let report = result?;
    print_json(&json!({
        "worker_id": worker.worker_id(),
        "recovered": report.recovered,
        "claimed": report.claimed,
        "sent": report.sent,
        "failed": report.failed,
        "malformed": report.malformed,
        "deferred": report.deferred,
        "released": report.released,
        "lost": report.lost,
        "store_errors": report.store_errors,
    }))
}

/// `herald seed [--count N]`
pub async fn seed(config: &HeraldConfig, count: Option<u32>) -> Result<(), HeraldError> {
    with_storage(config, async |storage| {
        let report = seed_messages(storage, &config.seed, count).await?;
        print_json(&json!({
            "pending_before": report.pending_before,
            "inserted": report.inserted,
        }))
    })
    .await
}

/// `herald list --status <s>` and `herald sent`
pub async fn list(
    config: &HeraldConfig,
    status: MessageStatus,
    limit: Option<u32>,
) -> Result<(), HeraldError> {
    with_storage(config, async |storage| {
        let messages = storage.list_by_status(status, limit).await?;
        print_json(&messages)
    })
    .await
}

/// `herald recipient <r>`
pub async fn recipient(
    config: &HeraldConfig,
    recipient: &str,
    limit: Option<u32>,
) -> Result<(), HeraldError> {
    with_storage(config, async |storage| {
        let messages = storage.list_by_recipient(recipient, limit).await?;
        print_json(&messages)
    })
    .await
}

/// `herald stats`
pub async fn stats(config: &HeraldConfig) -> Result<(), HeraldError> {
    with_storage(config, async |storage| {
        let mut counts = serde_json::Map::new();
        let mut total = 0;
        for status in MessageStatus::ALL {
            let n = storage.count_by_status(&[status]).await?;
            total += n;
            counts.insert(status.as_str().to_string(), Value::from(n));
        }
        counts.insert("total".to_string(), Value::from(total));
        print_json(&counts)
    })
    .await
}

/// `herald requeue <id>`
pub async fn requeue(config: &HeraldConfig, id: &str) -> Result<(), HeraldError> {
    with_storage(config, async |storage| {
        let requeued = storage.requeue(&MessageId::from(id)).await?;
        if requeued {
            info!(id, "message requeued");
        }
        print_json(&json!({ "id": id, "requeued": requeued }))
    })
    .await
}
