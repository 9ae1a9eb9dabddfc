// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the delivery webhook.
//!
//! Provides [`WebhookClient`], which handles request construction,
//! authentication and classification of the gateway's response.

use std::time::Duration;

use herald_core::HeraldError;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::types::{WebhookRequest, WebhookResponse};

/// HTTP client bound to one webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

impl WebhookClient {
    /// Creates a client that posts to `url`.
    ///
    /// When `auth_key` is set it is sent in the `auth_header` header on every request.
    pub fn new(
        url: String,
        auth_header: &str,
        auth_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, HeraldError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = auth_key {
            let name = HeaderName::from_bytes(auth_header.as_bytes())
                .map_err(|e| HeraldError::Config(format!("invalid auth header name: {e}")))?;
            let mut value = HeaderValue::from_str(key)
                .map_err(|e| HeraldError::Config(format!("invalid auth header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| HeraldError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts one message.
    ///
    /// Returns the decoded acknowledgement, or `None` when the gateway
    /// accepted the message but its body could not be decoded.
    pub async fn send_message(
        &self,
        to: &str,
        content: &str,
    ) -> Result<Option<WebhookResponse>, HeraldError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookRequest { to, content })
            .send()
            .await
            .map_err(|e| HeraldError::SenderUnavailable {
                message: format!("webhook request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "webhook response received");

        if status == StatusCode::OK || status == StatusCode::ACCEPTED {
            return match decode_ack(response.text().await) {
                Ok(ack) => Ok(Some(ack)),
                Err(AckProblem::Unreadable(e)) => {
                    warn!(error = %e, "webhook accepted the message but its body could not be read");
                    Ok(None)
                }
                Err(AckProblem::Undecodable(e)) => {
                    warn!(error = %e, "webhook accepted the message but the body is not valid JSON");
                    Ok(None)
                }
            };
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status = %status, error = %e, "failed to read webhook error body");
                String::new()
            }
        };
        let message = format!("webhook returned {status}: {}", body.trim());
        if is_transient_status(status) {
            warn!(status = %status, "webhook unavailable");
            Err(HeraldError::SenderUnavailable {
                message,
                source: None,
            })
        } else {
            Err(HeraldError::DeliveryRejected { message })
        }
    }
}

/// Why an accepted response carried no usable acknowledgement.
#[derive(Debug)]
enum AckProblem {
    Unreadable(String),
    Undecodable(String),
}

fn decode_ack<E: std::fmt::Display>(
    body: Result<String, E>,
) -> Result<WebhookResponse, AckProblem> {
    let body = body.map_err(|e| AckProblem::Unreadable(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| AckProblem::Undecodable(e.to_string()))
}

/// Statuses that mean "try again later" rather than "this message was refused".
fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> WebhookClient {
        WebhookClient::new(
            format!("{base_url}/send"),
            "x-ins-auth-key",
            Some("test-auth-key"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn transient_statuses() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
        assert!(!is_transient_status(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn unreadable_and_undecodable_bodies_are_told_apart() {
        let unreadable = decode_ack(Err::<String, _>("connection reset by peer"));
        assert!(matches!(
            unreadable,
            Err(AckProblem::Unreadable(e)) if e.contains("connection reset")
        ));

        let undecodable = decode_ack(Ok::<_, String>("<html>ok</html>".to_string()));
        assert!(matches!(undecodable, Err(AckProblem::Undecodable(_))));

        let ack = decode_ack(Ok::<_, String>(
            r#"{"message":"Accepted","messageId":"m-1"}"#.to_string(),
        ))
        .unwrap();
        assert_eq!(ack.message_id, "m-1");
    }

    #[test]
    fn invalid_header_name_is_config_error() {
        let err = WebhookClient::new(
            "http://localhost".into(),
            "bad header",
            Some("k"),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, HeraldError::Config(_)));
    }

    #[tokio::test]
    async fn sends_auth_and_content_type_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("x-ins-auth-key", "test-auth-key"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Accepted",
                "messageId": "m-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ack = test_client(&server.uri())
            .send_message("+1", "hello")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ack.message_id, "m-1");
    }

    #[tokio::test]
    async fn no_auth_header_without_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = WebhookClient::new(
            server.uri(),
            "x-ins-auth-key",
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        client.send_message("+1", "hello").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("x-ins-auth-key"));
    }

    #[tokio::test]
    async fn server_errors_and_throttling_are_unavailable() {
        for code in [429u16, 500, 503] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(code))
                .mount(&server)
                .await;

            let err = test_client(&server.uri())
                .send_message("+1", "hello")
                .await
                .unwrap_err();
            assert!(err.is_transient(), "{code} should be transient, got {err}");
        }
    }

    #[tokio::test]
    async fn client_errors_are_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad recipient"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .send_message("+1", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, HeraldError::DeliveryRejected { .. }));
        assert!(err.to_string().contains("bad recipient"), "got: {err}");
    }

    #[tokio::test]
    async fn unexpected_success_code_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .send_message("+1", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, HeraldError::DeliveryRejected { .. }));
    }

    #[tokio::test]
    async fn connection_refused_is_unavailable() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let err = test_client(&uri).send_message("+1", "hello").await.unwrap_err();
        assert!(matches!(err, HeraldError::SenderUnavailable { .. }));
    }

    #[tokio::test]
    async fn slow_gateway_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = WebhookClient::new(
            server.uri(),
            "x-ins-auth-key",
            None,
            Duration::from_millis(50),
        )
        .unwrap();
        let err = client.send_message("+1", "hello").await.unwrap_err();
        assert!(err.is_transient());
    }
}
