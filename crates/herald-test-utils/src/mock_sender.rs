// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock sender adapter for deterministic testing.
//!
//! `MockSender` implements `SenderAdapter` with scripted replies and records
//! every send so tests can assert on what reached the "gateway".

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use herald_core::{
    AdapterType, DeliveryReceipt, HealthStatus, HeraldError, PluginAdapter, SenderAdapter,
};

/// What the mock does for one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Accept, optionally returning a provider id.
    Deliver(Option<String>),
    /// Refuse the message (counts as a failed attempt).
    Reject(String),
    /// Behave like an unreachable or overloaded gateway.
    Unavailable(String),
    /// Wait before accepting, for timeout and shutdown tests.
    Delay(Duration),
}

/// A send the mock observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub payload: String,
}

/// A sender that replays scripted replies.
///
/// Replies are popped from a FIFO queue; once it is empty every send gets
/// the fallback reply (a delivery by default).
pub struct MockSender {
    replies: Mutex<VecDeque<MockReply>>,
    fallback: Mutex<MockReply>,
    sent: Mutex<Vec<SentMessage>>,
}

impl MockSender {
    /// A sender that accepts everything.
    pub fn new() -> Self {
        Self::with_fallback(MockReply::Deliver(None))
    }

    /// A sender that gives `fallback` for every unscripted send.
    pub fn with_fallback(fallback: MockReply) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A sender that replays `replies` before falling back to deliveries.
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from(replies)),
            ..Self::new()
        }
    }

    /// Queue one more scripted reply.
    pub async fn push_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Change the reply used once the script runs out.
    pub async fn set_fallback(&self, reply: MockReply) {
        *self.fallback.lock().await = reply;
    }

    /// Everything sent so far, in call order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Number of sends so far.
    pub async fn send_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    async fn next_reply(&self) -> MockReply {
        match self.replies.lock().await.pop_front() {
            Some(reply) => reply,
            None => self.fallback.lock().await.clone(),
        }
    }
}

impl Default for MockSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockSender {
    fn name(&self) -> &str {
        "mock-sender"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        Ok(())
    }
}

#[async_trait]
impl SenderAdapter for MockSender {
    async fn send(&self, recipient: &str, payload: &str) -> Result<DeliveryReceipt, HeraldError> {
        self.sent.lock().await.push(SentMessage {
            recipient: recipient.to_string(),
            payload: payload.to_string(),
        });

        match self.next_reply().await {
            MockReply::Deliver(provider_message_id) => Ok(DeliveryReceipt {
                provider_message_id,
                detail: Some("Accepted".to_string()),
            }),
            MockReply::Reject(message) => Err(HeraldError::DeliveryRejected { message }),
            MockReply::Unavailable(message) => Err(HeraldError::SenderUnavailable {
                message,
                source: None,
            }),
            MockReply::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(DeliveryReceipt::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_falls_back() {
        let sender = MockSender::with_replies(vec![
            MockReply::Reject("no".into()),
            MockReply::Unavailable("down".into()),
        ]);

        assert!(matches!(
            sender.send("+1", "a").await,
            Err(HeraldError::DeliveryRejected { .. })
        ));
        assert!(sender.send("+1", "b").await.unwrap_err().is_transient());
        assert!(sender.send("+1", "c").await.is_ok());

        let sent = sender.sent().await;
        let payloads: Vec<_> = sent.iter().map(|s| s.payload.as_str()).collect();
        assert_eq!(payloads, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn fallback_can_be_changed() {
        let sender = MockSender::new();
        sender.set_fallback(MockReply::Reject("always".into())).await;
        assert!(sender.send("+1", "x").await.is_err());
        sender.push_reply(MockReply::Deliver(Some("p-1".into()))).await;
        let receipt = sender.send("+1", "y").await.unwrap();
        assert_eq!(receipt.provider_message_id.as_deref(), Some("p-1"));
        assert_eq!(sender.send_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_reply_waits_before_accepting() {
        let sender = MockSender::with_replies(vec![MockReply::Delay(Duration::from_secs(10))]);
        let started = tokio::time::Instant::now();
        sender.send("+1", "slow").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(10));
    }
}
