// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook wire types.

use serde::{Deserialize, Serialize};

/// Request body posted for every message.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookRequest<'a> {
    pub to: &'a str,
    pub content: &'a str,
}

/// Acknowledgement returned by the gateway on 200/202.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "messageId")]
    pub message_id: String,
}
