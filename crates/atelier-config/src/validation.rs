// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::AtelierConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &AtelierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.session.ttl_secs == 0 {
        fail("session.ttl_secs must be greater than zero".to_string());
    }

    if config.bot.request_timeout_secs == 0 {
        fail("bot.request_timeout_secs must be greater than zero".to_string());
    }

    if config.notifications.queue_capacity == 0 {
        fail("notifications.queue_capacity must be greater than zero".to_string());
    }

    if config.reports.directory.trim().is_empty() {
        fail("reports.directory must not be empty".to_string());
    }

    let pricing = &config.pricing;
    if !(pricing.processing_cost_per_dm2 >= 0.0) {
        fail(format!(
            "pricing.processing_cost_per_dm2 must be non-negative, got {}",
            pricing.processing_cost_per_dm2
        ));
    }
    if !(pricing.markup_multiplier >= 1.0) {
        fail(format!(
            "pricing.markup_multiplier must be at least 1, got {}",
            pricing.markup_multiplier
        ));
    }
    if !(pricing.default_material_price_per_dm2 > 0.0) {
        fail(format!(
            "pricing.default_material_price_per_dm2 must be positive, got {}",
            pricing.default_material_price_per_dm2
        ));
    }
    for (name, rate) in [
        ("payment_commission_rate", pricing.payment_commission_rate),
        ("sales_tax_rate", pricing.sales_tax_rate),
    ] {
        if !(0.0..1.0).contains(&rate) {
            fail(format!("pricing.{name} must be in [0, 1), got {rate}"));
        }
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        fail("telegram.bot_token must not be empty when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
