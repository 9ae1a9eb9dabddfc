// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message inserts and the three read paths of the store.

use herald_core::types::format_timestamp;
use herald_core::{HeraldError, Message, MessageId, MessageStatus};
use rusqlite::{params, params_from_iter, types::Value};

use crate::database::{Database, map_tr_err};
use crate::queries::{MESSAGE_COLUMNS, placeholders, row_to_message, sql_limit};

/// Insert messages in a single transaction.
pub async fn insert_messages(db: &Database, messages: &[Message]) -> Result<(), HeraldError> {
    if messages.is_empty() {
        return Ok(());
    }
    let messages = messages.to_vec();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO messages (id, recipient, payload, status, created_at,
                         attempt_count, sent_at, provider_message_id, last_error, retryable)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )?;
                for msg in &messages {
                    stmt.execute(params![
                        msg.id.as_str(),
                        msg.recipient,
                        msg.payload,
                        msg.status.as_str(),
                        format_timestamp(&msg.created_at),
                        msg.attempt_count,
                        msg.sent_at.as_ref().map(format_timestamp),
                        msg.provider_message_id,
                        msg.last_error,
                        msg.retryable,
                    ])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a single message by identifier.
pub async fn get_message(db: &Database, id: &MessageId) -> Result<Option<Message>, HeraldError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Message>, rusqlite::Error> {
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
            match conn.query_row(&sql, params![id], row_to_message) {
                Ok(msg) => Ok(Some(msg)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Messages in any of `statuses`, oldest first.
///
/// Served by `idx_status_created_at`. Rows created in the same millisecond
/// keep insertion order.
pub async fn list_due(
    db: &Database,
    statuses: &[MessageStatus],
    limit: Option<u32>,
) -> Result<Vec<Message>, HeraldError> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }
    let mut args: Vec<Value> = statuses
        .iter()
        .map(|s| Value::Text(s.as_str().to_string()))
        .collect();
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         WHERE status IN ({})
         ORDER BY created_at ASC, rowid ASC
         LIMIT ?{}",
        placeholders(1, statuses.len()),
        statuses.len() + 1
    );
    args.push(Value::Integer(sql_limit(limit)));
    select_messages(db, sql, args).await
}

/// Messages in exactly `status`, oldest `created_at` first. Filtered through `idx_status`.
pub async fn list_by_status(
    db: &Database,
    status: MessageStatus,
    limit: Option<u32>,
) -> Result<Vec<Message>, HeraldError> {
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages INDEXED BY idx_status
         WHERE status = ?1
         ORDER BY created_at ASC, rowid ASC
         LIMIT ?2"
    );
    let args = vec![
        Value::Text(status.as_str().to_string()),
        Value::Integer(sql_limit(limit)),
    ];
    select_messages(db, sql, args).await
}

/// Messages addressed to `recipient`, oldest first.
///
/// Served by the partial `idx_recipient`; messages without a recipient are
/// never returned.
pub async fn list_by_recipient(
    db: &Database,
    recipient: &str,
    limit: Option<u32>,
) -> Result<Vec<Message>, HeraldError> {
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         WHERE recipient = ?1 AND recipient IS NOT NULL
         ORDER BY created_at ASC, rowid ASC
         LIMIT ?2"
    );
    let args = vec![
        Value::Text(recipient.to_string()),
        Value::Integer(sql_limit(limit)),
    ];
    select_messages(db, sql, args).await
}

/// Number of messages in any of `statuses`.
pub async fn count_by_status(
    db: &Database,
    statuses: &[MessageStatus],
) -> Result<u64, HeraldError> {
    if statuses.is_empty() {
        return Ok(0);
    }
    let args: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
    let sql = format!(
        "SELECT COUNT(*) FROM messages WHERE status IN ({})",
        placeholders(1, args.len())
    );
    let count = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(&sql, params_from_iter(args.iter()), |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)?;
    Ok(count.max(0) as u64)
}

async fn select_messages(
    db: &Database,
    sql: String,
    args: Vec<Value>,
) -> Result<Vec<Message>, HeraldError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
