// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Herald dispatch worker.

use thiserror::Error;

use crate::types::MessageStatus;

/// The primary error type used across all Herald adapter traits and core operations.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The sender capability could not be reached or asked us to back off.
    #[error("sender unavailable: {message}")]
    SenderUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The sender was reached but refused to deliver the message.
    #[error("delivery rejected: {message}")]
    DeliveryRejected { message: String },

    /// A status change outside pending->sent, pending->failed, failed->pending.
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition {
        from: MessageStatus,
        to: MessageStatus,
    },

    /// The worker no longer owns the claim on a message it tried to update.
    #[error("claim on message {id} is no longer held by worker {worker_id}")]
    ClaimLost { id: String, worker_id: String },

    /// A message with the given identifier does not exist.
    #[error("message not found: {0}")]
    NotFound(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HeraldError {
    /// Whether a delivery that failed with this error should simply be tried again later.
    ///
    /// Transient errors leave the message pending with its attempt count untouched.
    /// Everything else that comes back from a sender counts as a failed attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HeraldError::SenderUnavailable { .. } | HeraldError::Timeout { .. }
        )
    }

    /// Wraps any error as a storage error.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        HeraldError::Storage {
            source: source.into(),
        }
    }
}
