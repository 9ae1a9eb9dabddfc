// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of being silently ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deployment environments accepted in `service.environment`.
pub const ENVIRONMENTS: [&str; 4] = ["local", "dev", "stg", "prod"];

/// Top-level Herald configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeraldConfig {
    /// Service identity and process behavior.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Message store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Dispatch worker tuning.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Webhook sender settings.
    #[serde(default)]
    pub sender: SenderConfig,

    /// Local bootstrap seeding.
    #[serde(default)]
    pub seed: SeedConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Service identity and process behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name reported in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// One of `local`, `dev`, `stg`, `prod`.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long `serve` waits for the dispatch loop to drain on shutdown.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            environment: default_environment(),
            log_level: default_log_level(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_service_name() -> String {
    "herald".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

/// Message store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("herald").join("herald.db"))
        .and_then(|p| p.to_str().map(str::to_string))
        .unwrap_or_else(|| "herald.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Dispatch worker tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Seconds between polling cycles. The first cycle runs immediately.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum number of messages claimed per cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Maximum number of concurrent sends within a cycle.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Failed messages whose attempt count exceeds this are left for manual inspection.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Upper bound on a single send; exceeding it counts as sender unavailable.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// Age after which a claim is considered orphaned and released.
    #[serde(default = "default_claim_lease_secs")]
    pub claim_lease_secs: u64,

    /// Tries per status write before giving up on recording an outcome.
    #[serde(default = "default_store_retry_attempts")]
    pub store_retry_attempts: u32,

    /// Pause between status write tries.
    #[serde(default = "default_store_retry_delay_ms")]
    pub store_retry_delay_ms: u64,

    /// Payloads longer than this many characters are malformed.
    #[serde(default = "default_max_payload_chars")]
    pub max_payload_chars: usize,

    /// Start the dispatch loop as soon as `serve` boots.
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

impl DispatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn claim_lease(&self) -> Duration {
        Duration::from_secs(self.claim_lease_secs)
    }

    pub fn store_retry_delay(&self) -> Duration {
        Duration::from_millis(self.store_retry_delay_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            batch_size: default_batch_size(),
            max_in_flight: default_max_in_flight(),
            retry_limit: default_retry_limit(),
            send_timeout_secs: default_send_timeout_secs(),
            claim_lease_secs: default_claim_lease_secs(),
            store_retry_attempts: default_store_retry_attempts(),
            store_retry_delay_ms: default_store_retry_delay_ms(),
            max_payload_chars: default_max_payload_chars(),
            autostart: default_autostart(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    2
}

fn default_max_in_flight() -> usize {
    2
}

fn default_retry_limit() -> u32 {
    3
}

fn default_send_timeout_secs() -> u64 {
    30
}

fn default_claim_lease_secs() -> u64 {
    300
}

fn default_store_retry_attempts() -> u32 {
    3
}

fn default_store_retry_delay_ms() -> u64 {
    100
}

fn default_max_payload_chars() -> usize {
    1000
}

fn default_autostart() -> bool {
    true
}

/// Webhook sender configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SenderConfig {
    /// Webhook endpoint. `None` means no sender is configured and `serve` refuses to start.
    #[serde(default)]
    pub url: Option<String>,

    /// Value of the authentication header. `None` sends no auth header.
    #[serde(default)]
    pub auth_key: Option<String>,

    /// Name of the authentication header.
    #[serde(default = "default_auth_header")]
    pub auth_header: String,

    /// HTTP client timeout in seconds.
    #[serde(default = "default_sender_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            url: None,
            auth_key: None,
            auth_header: default_auth_header(),
            timeout_secs: default_sender_timeout_secs(),
        }
    }
}

fn default_auth_header() -> String {
    "x-ins-auth-key".to_string()
}

fn default_sender_timeout_secs() -> u64 {
    30
}

/// Seeding of demo messages for local bootstrapping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    /// Seeding only happens while fewer than this many messages are pending.
    #[serde(default = "default_target_pending")]
    pub target_pending: u64,

    /// Number of messages inserted per seeding run.
    #[serde(default = "default_seed_batch_size")]
    pub batch_size: u32,

    /// Recipient used for seeded messages.
    #[serde(default = "default_seed_recipient")]
    pub recipient: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            target_pending: default_target_pending(),
            batch_size: default_seed_batch_size(),
            recipient: default_seed_recipient(),
        }
    }
}

fn default_target_pending() -> u64 {
    2
}

fn default_seed_batch_size() -> u32 {
    20
}

fn default_seed_recipient() -> String {
    "+905551111111".to_string()
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Expose `/metrics` while serving.
    #[serde(default)]
    pub enabled: bool,

    /// Socket address of the exporter's HTTP listener.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_address: default_listen_address(),
        }
    }
}

fn default_listen_address() -> String {
    "127.0.0.1:9464".to_string()
}
