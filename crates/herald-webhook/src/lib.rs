// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook sender adapter for the Herald dispatch worker.
//!
//! Delivers each message as `POST {"to", "content"}` to a configured URL and
//! classifies the response for the worker: 200/202 is a delivery,
//! connection failures, timeouts, 429 and 5xx mean the gateway is
//! unavailable, and any other status is a rejection.

pub mod client;
pub mod types;

use async_trait::async_trait;
use herald_config::model::SenderConfig;
use herald_core::{
    AdapterType, DeliveryReceipt, HealthStatus, HeraldError, PluginAdapter, SenderAdapter,
};
use tracing::debug;

use crate::client::WebhookClient;

/// [`SenderAdapter`] backed by an HTTP webhook.
pub struct WebhookSender {
    client: WebhookClient,
}

impl WebhookSender {
    /// Build a sender from `[sender]` config. Fails when no URL is configured.
    pub fn new(config: &SenderConfig) -> Result<Self, HeraldError> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| HeraldError::Config("sender.url is not set".into()))?;
        let client = WebhookClient::new(
            url,
            &config.auth_header,
            config.auth_key.as_deref(),
            std::time::Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self { client })
    }

    /// The endpoint messages are posted to.
    pub fn url(&self) -> &str {
        self.client.url()
    }
}

#[async_trait]
impl PluginAdapter for WebhookSender {
    fn name(&self) -> &str {
        "webhook"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        // Probing would deliver a message; only the configuration is checked.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        debug!(url = %self.client.url(), "webhook sender shut down");
        Ok(())
    }
}

#[async_trait]
impl SenderAdapter for WebhookSender {
    async fn send(&self, recipient: &str, payload: &str) -> Result<DeliveryReceipt, HeraldError> {
        let response = self.client.send_message(recipient, payload).await?;
        Ok(DeliveryReceipt {
            provider_message_id: response
                .as_ref()
                .map(|r| r.message_id.clone())
                .filter(|id| !id.is_empty()),
            detail: response.map(|r| r.message).filter(|m| !m.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: Option<String>) -> SenderConfig {
        SenderConfig {
            url,
            auth_key: Some("secret".into()),
            ..SenderConfig::default()
        }
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let err = WebhookSender::new(&config(None)).err().unwrap();
        assert!(matches!(err, HeraldError::Config(_)));
    }

    #[tokio::test]
    async fn adapter_identity() {
        let sender = WebhookSender::new(&config(Some("http://localhost:1/hook".into()))).unwrap();
        assert_eq!(sender.name(), "webhook");
        assert_eq!(sender.adapter_type(), AdapterType::Sender);
        assert_eq!(sender.url(), "http://localhost:1/hook");
        assert_eq!(sender.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn send_returns_provider_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({"to": "+905551111111", "content": "hi"})))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "message": "Accepted",
                "messageId": "67f2f8a8-ea58-4ed0-a6f9-ff217df4d849"
            })))
            .mount(&server)
            .await;

        let sender = WebhookSender::new(&config(Some(server.uri()))).unwrap();
        let receipt = sender.send("+905551111111", "hi").await.unwrap();
        assert_eq!(
            receipt.provider_message_id.as_deref(),
            Some("67f2f8a8-ea58-4ed0-a6f9-ff217df4d849")
        );
        assert_eq!(receipt.detail.as_deref(), Some("Accepted"));
    }

    #[tokio::test]
    async fn undecodable_success_body_still_counts_as_delivered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let sender = WebhookSender::new(&config(Some(server.uri()))).unwrap();
        let receipt = sender.send("+1", "hi").await.unwrap();
        assert_eq!(receipt, DeliveryReceipt::default());
    }
}
