// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `/etc/atelier/atelier.toml`, then `~/.config/atelier/atelier.toml`,
//! then `./atelier.toml`, then `ATELIER_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use tracing::debug;

use crate::model::AtelierConfig;

/// Sections that environment variables may address.
const ENV_SECTIONS: &[&str] = &[
    "bot",
    "telegram",
    "admin",
    "storage",
    "session",
    "pricing",
    "reports",
    "notifications",
];

/// TOML files consulted by [`load_config`], lowest precedence first.
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("/etc/atelier/atelier.toml")];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("atelier").join("atelier.toml"));
    }
    files.push(PathBuf::from("atelier.toml"));
    files
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<AtelierConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<AtelierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AtelierConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AtelierConfig, figment::Error> {
    debug!(path = %path.display(), "loading explicit config file");
    Figment::new()
        .merge(Serialized::defaults(AtelierConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    config_file_candidates().into_iter().fold(
        Figment::new().merge(Serialized::defaults(AtelierConfig::default())),
        |figment, file| {
            if file.is_file() {
                debug!(path = %file.display(), "merging config file");
            }
            figment.merge(Toml::file(file))
        },
    )
    .merge(env_provider())
}

/// Maps `ATELIER_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `ATELIER_TELEGRAM_BOT_TOKEN` resolves to `telegram.bot_token`.
fn env_provider() -> Env {
    Env::prefixed("ATELIER_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
