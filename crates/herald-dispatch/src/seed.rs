// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local bootstrap: top up the store with demo messages.

use herald_config::model::SeedConfig;
use herald_core::{HeraldError, Message, MessageStatus, StorageAdapter};
use tracing::info;

/// Result of one seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    /// Pending messages found before seeding.
    pub pending_before: u64,
    /// Messages inserted by this run.
    pub inserted: usize,
}

/// Insert demo messages when the store is short of pending work.
///
/// With `count` set, exactly that many are inserted unconditionally.
/// Otherwise `config.batch_size` are inserted only while fewer than
/// `config.target_pending` messages are pending.
pub async fn seed_messages(
    storage: &dyn StorageAdapter,
    config: &SeedConfig,
    count: Option<u32>,
) -> Result<SeedReport, HeraldError> {
    let pending_before = storage.count_by_status(&[MessageStatus::Pending]).await?;

    let to_insert = match count {
        Some(n) => n,
        None if pending_before < config.target_pending => config.batch_size,
        None => {
            info!(
                pending = pending_before,
                target = config.target_pending,
                "enough pending messages, not seeding"
            );
            0
        }
    };

    let messages: Vec<Message> = (0..to_insert)
        .map(|i| {
            Message::new(
                Some(config.recipient.clone()),
                format!("Auto generated message {i}"),
            )
        })
        .collect();
    storage.insert_messages(&messages).await?;

    if !messages.is_empty() {
        info!(
            count = messages.len(),
            pending_before,
            recipient = %config.recipient,
            "seeded messages"
        );
    }
    Ok(SeedReport {
        pending_before,
        inserted: messages.len(),
    })
}
