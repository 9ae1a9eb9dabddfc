// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message model and common types shared by the store, the sender adapters and the worker.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Fixed-width UTC layout used for every persisted timestamp.
///
/// Millisecond precision and a literal `Z` keep lexicographic order equal to
/// chronological order, which the `(status, created_at)` index relies on.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Render a timestamp in [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp written by [`format_timestamp`] (any RFC 3339 value is accepted).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Current time truncated to the precision the store keeps.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        MessageId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        MessageId(value.to_string())
    }
}

/// Delivery state of a message.
///
/// The only legal transitions are pending -> sent, pending -> failed and
/// failed -> pending (a retry). `Sent` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [MessageStatus; 3] = [
        MessageStatus::Pending,
        MessageStatus::Sent,
        MessageStatus::Failed,
    ];

    /// Statuses the worker picks work from.
    pub const DUE: [MessageStatus; 2] = [MessageStatus::Pending, MessageStatus::Failed];

    /// The lowercase name stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }

    /// Whether `self -> next` is one of the permitted transitions.
    pub fn can_transition_to(self, next: MessageStatus) -> bool {
        matches!(
            (self, next),
            (MessageStatus::Pending, MessageStatus::Sent)
                | (MessageStatus::Pending, MessageStatus::Failed)
                | (MessageStatus::Failed, MessageStatus::Pending)
        )
    }
}

/// A persisted outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Destination address. Optional: not every message carries one, which is
    /// why the recipient index is sparse.
    pub recipient: Option<String>,
    pub payload: String,
    pub status: MessageStatus,
    /// Set once on creation and never rewritten.
    pub created_at: DateTime<Utc>,
    /// Number of delivery attempts the sender rejected.
    pub attempt_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Cleared when the message is permanently failed (malformed).
    pub retryable: bool,
}

impl Message {
    /// A new pending message created now.
    pub fn new(recipient: Option<String>, payload: impl Into<String>) -> Self {
        Self::with_created_at(recipient, payload, now_millis())
    }

    /// A new pending message with an explicit creation time.
    pub fn with_created_at(
        recipient: Option<String>,
        payload: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            recipient,
            payload: payload.into(),
            status: MessageStatus::Pending,
            created_at: created_at.trunc_subsecs(3),
            attempt_count: 0,
            sent_at: None,
            provider_message_id: None,
            last_error: None,
            retryable: true,
        }
    }
}

/// What the sender hands back after accepting a message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Provider-side identifier, when the provider returns one.
    pub provider_message_id: Option<String>,
    /// Free-form acknowledgement text from the provider.
    pub detail: Option<String>,
}

/// The result of one delivery attempt, as recorded in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// pending -> sent.
    Delivered {
        provider_message_id: Option<String>,
        sent_at: DateTime<Utc>,
    },
    /// pending -> failed, attempt count incremented.
    Rejected { reason: String },
    /// pending -> failed, never retried automatically.
    Malformed { reason: String },
    /// Stays pending; the claim is released for the next cycle.
    Deferred { reason: String },
}

impl DeliveryOutcome {
    /// The status the message ends up in after this outcome.
    pub fn resulting_status(&self) -> MessageStatus {
        match self {
            DeliveryOutcome::Delivered { .. } => MessageStatus::Sent,
            DeliveryOutcome::Rejected { .. } | DeliveryOutcome::Malformed { .. } => {
                MessageStatus::Failed
            }
            DeliveryOutcome::Deferred { .. } => MessageStatus::Pending,
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered { .. } => "sent",
            DeliveryOutcome::Rejected { .. } => "failed",
            DeliveryOutcome::Malformed { .. } => "malformed",
            DeliveryOutcome::Deferred { .. } => "deferred",
        }
    }
}

/// Parameters of an atomic claim of due messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    /// Owner recorded on every claimed row.
    pub worker_id: String,
    /// Maximum number of messages to claim.
    pub limit: u32,
    /// Failed messages whose attempt count exceeds this are left alone.
    pub retry_limit: u32,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Sender,
    Storage,
}
