// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Herald configuration system.

use herald_config::diagnostic::ConfigError;
use herald_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[service]
name = "sender"
environment = "prod"
log_level = "debug"
shutdown_grace_secs = 5

[storage]
database_path = "/tmp/herald-test.db"
wal_mode = false

[dispatch]
poll_interval_secs = 10
batch_size = 50
max_in_flight = 8
retry_limit = 5
send_timeout_secs = 15
claim_lease_secs = 60
store_retry_attempts = 4
store_retry_delay_ms = 250
max_payload_chars = 160
autostart = false

[sender]
url = "https://gateway.example.com/send"
auth_key = "secret"
auth_header = "x-api-key"
timeout_secs = 10

[seed]
target_pending = 10
batch_size = 5
recipient = "+15550000000"

[prometheus]
enabled = true
listen_address = "0.0.0.0:9100"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "sender");
    assert_eq!(config.service.environment, "prod");
    assert_eq!(config.service.shutdown_grace_secs, 5);
    assert_eq!(config.storage.database_path, "/tmp/herald-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.dispatch.batch_size, 50);
    assert_eq!(config.dispatch.max_in_flight, 8);
    assert_eq!(config.dispatch.retry_limit, 5);
    assert_eq!(config.dispatch.store_retry_delay_ms, 250);
    assert_eq!(config.dispatch.max_payload_chars, 160);
    assert!(!config.dispatch.autostart);
    assert_eq!(
        config.sender.url.as_deref(),
        Some("https://gateway.example.com/send")
    );
    assert_eq!(config.sender.auth_header, "x-api-key");
    assert_eq!(config.seed.recipient, "+15550000000");
    assert!(config.prometheus.enabled);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.service.name, "herald");
    assert_eq!(config.service.environment, "dev");
    assert_eq!(config.dispatch.poll_interval_secs, 120);
    assert_eq!(config.dispatch.batch_size, 2);
    assert_eq!(config.dispatch.retry_limit, 3);
    assert_eq!(config.dispatch.send_timeout_secs, 30);
    assert_eq!(config.dispatch.store_retry_attempts, 3);
    assert_eq!(config.dispatch.store_retry_delay_ms, 100);
    assert_eq!(config.dispatch.max_payload_chars, 1000);
    assert!(config.dispatch.autostart);
    assert!(config.sender.url.is_none());
    assert_eq!(config.sender.auth_header, "x-ins-auth-key");
    assert_eq!(config.seed.target_pending, 2);
    assert_eq!(config.seed.batch_size, 20);
    assert!(!config.prometheus.enabled);
}

#[test]
fn misspelled_key_is_reported_with_suggestion() {
    let toml = r#"
[dispatch]
retry_limt = 4
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } if key == "retry_limt" => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("retry_limit"));
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[dispatch]
batch_size = "many"
"#;
    let errors = load_and_validate_str(toml).expect_err("string batch size must be rejected");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("batch_size")))
    );
}

#[test]
fn semantic_errors_surface_through_load_and_validate() {
    let toml = r#"
[service]
environment = "staging"
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown environment must fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("service.environment")))
    );
}

#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[dispatch]
batch_size = 4

[sender]
url = "http://localhost:9000/hook"
"#,
        )?;
        jail.set_env("HERALD_DISPATCH_BATCH_SIZE", "9");
        jail.set_env("HERALD_SENDER_AUTH_KEY", "from-env");

        let path = jail.directory().join("custom.toml");
        let config = load_and_validate_path(&path).expect("config should load");
        assert_eq!(config.dispatch.batch_size, 9);
        assert_eq!(config.sender.auth_key.as_deref(), Some("from-env"));
        assert_eq!(
            config.sender.url.as_deref(),
            Some("http://localhost:9000/hook")
        );
        Ok(())
    });
}
