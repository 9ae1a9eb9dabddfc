// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the message store.
//!
//! `messages` covers inserts and the three read paths; `claims` covers the
//! write side of the dispatch protocol.

pub mod claims;
pub mod messages;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use herald_core::types::parse_timestamp;
use herald_core::{Message, MessageId, MessageStatus};
use rusqlite::types::Type;

/// Column list matching [`row_to_message`].
pub(crate) const MESSAGE_COLUMNS: &str = "id, recipient, payload, status, created_at, \
     attempt_count, sent_at, provider_message_id, last_error, retryable";

/// Map a row selected with [`MESSAGE_COLUMNS`] into a [`Message`].
pub(crate) fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let status: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let sent_at: Option<String> = row.get(6)?;
    Ok(Message {
        id: MessageId(row.get(0)?),
        recipient: row.get(1)?,
        payload: row.get(2)?,
        status: MessageStatus::from_str(&status)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        created_at: timestamp_column(4, &created_at)?,
        attempt_count: row.get(5)?,
        sent_at: sent_at
            .map(|value| timestamp_column(6, &value))
            .transpose()?,
        provider_message_id: row.get(7)?,
        last_error: row.get(8)?,
        retryable: row.get(9)?,
    })
}

fn timestamp_column(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    parse_timestamp(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// `?1, ?2, ...` for an `IN (...)` list starting at parameter `first`.
pub(crate) fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SQLite treats a negative LIMIT as "no limit".
pub(crate) fn sql_limit(limit: Option<u32>) -> i64 {
    limit.map(i64::from).unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_from_first() {
        assert_eq!(placeholders(1, 3), "?1, ?2, ?3");
        assert_eq!(placeholders(2, 1), "?2");
    }

    #[test]
    fn missing_limit_means_unbounded() {
        assert_eq!(sql_limit(None), -1);
        assert_eq!(sql_limit(Some(25)), 25);
    }
}
