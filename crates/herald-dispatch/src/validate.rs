// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-send checks that mark a message as permanently undeliverable.

use herald_core::Message;
use thiserror::Error;

/// Why a message can never be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Malformed {
    #[error("recipient is missing")]
    MissingRecipient,

    #[error("payload is empty")]
    EmptyPayload,

    #[error("payload is {chars} characters, limit is {max}")]
    PayloadTooLong { chars: usize, max: usize },
}

/// Check a message before it is handed to the sender.
///
/// Returns the recipient to deliver to. Length is counted in characters,
/// not bytes.
pub fn validate_message(message: &Message, max_payload_chars: usize) -> Result<&str, Malformed> {
    let recipient = message
        .recipient
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(Malformed::MissingRecipient)?;

    if message.payload.trim().is_empty() {
        return Err(Malformed::EmptyPayload);
    }

    let chars = message.payload.chars().count();
    if chars > max_payload_chars {
        return Err(Malformed::PayloadTooLong {
            chars,
            max: max_payload_chars,
        });
    }

    Ok(recipient)
}
