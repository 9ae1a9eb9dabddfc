// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express (non-zero sizes, known
//! environments, well-formed addresses). All problems are collected rather
//! than failing on the first one.

use std::net::SocketAddr;

use crate::diagnostic::ConfigError;
use crate::model::{ENVIRONMENTS, HeraldConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &HeraldConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !ENVIRONMENTS.contains(&config.service.environment.as_str()) {
        fail(format!(
            "service.environment must be one of {}, got `{}`",
            ENVIRONMENTS.join(", "),
            config.service.environment
        ));
    }

    if !LOG_LEVELS.contains(&config.service.log_level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "service.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.service.log_level
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let dispatch = &config.dispatch;
    if dispatch.poll_interval_secs == 0 {
        fail("dispatch.poll_interval_secs must be at least 1".to_string());
    }
    if dispatch.batch_size == 0 {
        fail("dispatch.batch_size must be at least 1".to_string());
    }
    if dispatch.max_in_flight == 0 {
        fail("dispatch.max_in_flight must be at least 1".to_string());
    }
    if dispatch.send_timeout_secs == 0 {
        fail("dispatch.send_timeout_secs must be at least 1".to_string());
    }
    if dispatch.store_retry_attempts == 0 {
        fail("dispatch.store_retry_attempts must be at least 1".to_string());
    }
    if dispatch.max_payload_chars == 0 {
        fail("dispatch.max_payload_chars must be at least 1".to_string());
    }
    // A claim is restamped right before each send and must outlive the send
    // plus every retry of the outcome write.
    let record_budget_ms = u64::from(dispatch.store_retry_attempts.saturating_sub(1))
        .saturating_mul(dispatch.store_retry_delay_ms);
    let held_ms = dispatch
        .send_timeout_secs
        .saturating_mul(1000)
        .saturating_add(record_budget_ms);
    if dispatch.claim_lease_secs.saturating_mul(1000) <= held_ms {
        fail(format!(
            "dispatch.claim_lease_secs ({}) must exceed dispatch.send_timeout_secs ({}) \
             plus the outcome write retries ({record_budget_ms} ms)",
            dispatch.claim_lease_secs, dispatch.send_timeout_secs
        ));
    }

    if let Some(url) = &config.sender.url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            fail(format!("sender.url `{url}` must be an http:// or https:// URL"));
        }
    }
    if config.sender.auth_header.trim().is_empty() {
        fail("sender.auth_header must not be empty".to_string());
    }
    if config.sender.timeout_secs == 0 {
        fail("sender.timeout_secs must be at least 1".to_string());
    }

    if config.seed.recipient.trim().is_empty() {
        fail("seed.recipient must not be empty".to_string());
    }

    if config.prometheus.enabled
        && config.prometheus.listen_address.parse::<SocketAddr>().is_err()
    {
        fail(format!(
            "prometheus.listen_address `{}` is not a socket address",
            config.prometheus.listen_address
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&HeraldConfig::default()).is_ok());
    }

    #[test]
    fn unknown_environment_fails() {
        let mut config = HeraldConfig::default();
        config.service.environment = "qa".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "service.environment"));
    }

    #[test]
    fn zero_batch_size_and_in_flight_are_both_reported() {
        let mut config = HeraldConfig::default();
        config.dispatch.batch_size = 0;
        config.dispatch.max_in_flight = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "dispatch.batch_size"));
        assert!(has_error(&errors, "dispatch.max_in_flight"));
    }

    #[test]
    fn lease_shorter_than_send_timeout_fails() {
        let mut config = HeraldConfig::default();
        config.dispatch.claim_lease_secs = 10;
        config.dispatch.send_timeout_secs = 30;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "claim_lease_secs"));
    }

    #[test]
    fn lease_must_cover_outcome_write_retries() {
        let mut config = HeraldConfig::default();
        config.dispatch.send_timeout_secs = 10;
        config.dispatch.store_retry_attempts = 3;
        config.dispatch.store_retry_delay_ms = 1_000;
        config.dispatch.claim_lease_secs = 11;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "outcome write retries (2000 ms)"));

        config.dispatch.claim_lease_secs = 13;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn non_http_sender_url_fails() {
        let mut config = HeraldConfig::default();
        config.sender.url = Some("ftp://gateway.local/send".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "sender.url"));
    }

    #[test]
    fn bad_prometheus_address_only_matters_when_enabled() {
        let mut config = HeraldConfig::default();
        config.prometheus.listen_address = "not-an-address".to_string();
        assert!(validate_config(&config).is_ok());

        config.prometheus.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "prometheus.listen_address"));
    }
}
