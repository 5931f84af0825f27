// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Atelier order bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Atelier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AtelierConfig {
    /// Process-wide behaviour of the bot.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Administrator and staff channel settings.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversation session settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Business-wide cost configuration for the pricing engine.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Spreadsheet export settings.
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Background notification settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Process-wide bot behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound for any single session store, repository or gateway call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional image shown with the privacy agreement prompt.
    #[serde(default)]
    pub welcome_image_url: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_secs: default_request_timeout_secs(),
            welcome_image_url: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `atelier serve`.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// Administrators and the staff channel.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// Primary administrator chat.
    #[serde(default)]
    pub chat_id: Option<i64>,

    /// Additional administrator user ids.
    #[serde(default)]
    pub admin_ids: Vec<i64>,

    /// Staff channel receiving new-order and agreement notices.
    #[serde(default)]
    pub channel_id: Option<i64>,
}

impl AdminConfig {
    /// True if `user_id` may run admin commands.
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.chat_id == Some(user_id) || self.admin_ids.contains(&user_id)
    }

    /// Every chat that receives admin notices, primary chat first, without duplicates.
    pub fn admin_chats(&self) -> Vec<i64> {
        let mut chats = Vec::new();
        if let Some(id) = self.chat_id {
            chats.push(id);
        }
        for id in &self.admin_ids {
            if !chats.contains(id) {
                chats.push(*id);
            }
        }
        chats
    }
}

/// Storage backend configuration.
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
        .map(|p| p.join("atelier").join("atelier.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("atelier.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Where conversation state lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Table in the main SQLite database; survives restarts.
    #[default]
    Sqlite,
    /// Process memory; lost on restart.
    Memory,
}

/// Conversation session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,

    /// Abandoned conversations expire after this many seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_session_ttl_secs() -> u64 {
    24 * 60 * 60
}

/// Business-wide cost configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Labour and consumables per dm², independent of material.
    #[serde(default = "default_processing_cost")]
    pub processing_cost_per_dm2: f64,

    /// Share of the final price taken by the payment provider.
    #[serde(default = "default_commission_rate")]
    pub payment_commission_rate: f64,

    /// Share of the final price paid as sales tax.
    #[serde(default = "default_tax_rate")]
    pub sales_tax_rate: f64,

    /// Factor applied to total cost to obtain the customer-facing price.
    #[serde(default = "default_markup")]
    pub markup_multiplier: f64,

    /// Material price used for quotes before a material is chosen.
    #[serde(default = "default_material_price")]
    pub default_material_price_per_dm2: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            processing_cost_per_dm2: default_processing_cost(),
            payment_commission_rate: default_commission_rate(),
            sales_tax_rate: default_tax_rate(),
            markup_multiplier: default_markup(),
            default_material_price_per_dm2: default_material_price(),
        }
    }
}

fn default_processing_cost() -> f64 {
    31.25
}

fn default_commission_rate() -> f64 {
    0.03
}

fn default_tax_rate() -> f64 {
    0.06
}

fn default_markup() -> f64 {
    2.5
}

fn default_material_price() -> f64 {
    25.0
}

/// Spreadsheet export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportsConfig {
    /// Directory export files are written to. Created on demand.
    #[serde(default = "default_reports_dir")]
    pub directory: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            directory: default_reports_dir(),
        }
    }
}

fn default_reports_dir() -> String {
    "reports".to_string()
}

/// Background notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Jobs buffered before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_business_constants() {
        let pricing = PricingConfig::default();
        assert!((pricing.processing_cost_per_dm2 - 31.25).abs() < f64::EPSILON);
        assert!((pricing.markup_multiplier - 2.5).abs() < f64::EPSILON);
        assert_eq!(SessionConfig::default().ttl_secs, 86_400);
    }

    #[test]
    fn admin_membership_covers_chat_and_list() {
        let admin = AdminConfig {
            chat_id: Some(1),
            admin_ids: vec![2, 1, 3],
            channel_id: None,
        };
        assert!(admin.is_admin(1));
        assert!(admin.is_admin(3));
        assert!(!admin.is_admin(4));
        assert_eq!(admin.admin_chats(), vec![1, 2, 3]);
    }

    #[test]
    fn no_admins_by_default() {
        let admin = AdminConfig::default();
        assert!(!admin.is_admin(0));
        assert!(admin.admin_chats().is_empty());
    }
}
