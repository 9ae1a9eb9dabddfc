// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender capability: the abstract external delivery mechanism (email/SMS gateway, webhook).

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::traits::adapter::PluginAdapter;
use crate::types::DeliveryReceipt;

/// Delivers one message payload to one recipient.
///
/// Implementations report failures through [`HeraldError`]:
/// [`HeraldError::SenderUnavailable`] and [`HeraldError::Timeout`] are transient
/// and leave the message pending; [`HeraldError::DeliveryRejected`] (or any
/// other error) counts as a failed attempt.
#[async_trait]
pub trait SenderAdapter: PluginAdapter {
    /// Sends `payload` to `recipient`.
    async fn send(&self, recipient: &str, payload: &str) -> Result<DeliveryReceipt, HeraldError>;
}
