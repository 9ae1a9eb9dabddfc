// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `/etc/herald/herald.toml`, `~/.config/herald/herald.toml`,
//! `./herald.toml`, then `HERALD_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HeraldConfig;

/// Top-level sections, used to turn `HERALD_DISPATCH_BATCH_SIZE` into `dispatch.batch_size`.
const SECTIONS: [&str; 6] = [
    "service",
    "storage",
    "dispatch",
    "sender",
    "seed",
    "prometheus",
];

/// Config files consulted by [`load_config`], lowest precedence first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/herald/herald.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("herald").join("herald.toml"));
    }
    paths.push(PathBuf::from("herald.toml"));
    paths
}

/// Build the layered Figment without extracting it.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(HeraldConfig::default()));
    for path in config_file_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Load configuration from the standard file hierarchy with env var overrides.
pub fn load_config() -> Result<HeraldConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, still honoring env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// `HERALD_`-prefixed environment provider.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `HERALD_SENDER_AUTH_KEY` maps to `sender.auth_key` rather than `sender.auth.key`.
fn env_provider() -> Env {
    Env::prefixed("HERALD_").map(|key| section_key(key.as_str()).into())
}

fn section_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}
