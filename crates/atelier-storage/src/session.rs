// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed [`SessionStore`].
//!
//! State is stored as JSON next to an absolute expiry. Expired rows are
//! invisible to `get` and swept by [`SqliteSessionStore::purge_expired`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use atelier_core::types::{AdapterType, ConversationState, HealthStatus, UserId};
use atelier_core::{AtelierError, PluginAdapter, SessionStore};

use crate::database::Database;
use crate::queries::sessions;

pub struct SqliteSessionStore {
    db: Database,
    ttl: Duration,
}

impl SqliteSessionStore {
    pub fn new(db: Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Deletes expired rows; returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, AtelierError> {
        sessions::purge_expired(&self.db, Utc::now()).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite-sessions"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionStore
    }

    async fn health_check(&self) -> Result<HealthStatus, AtelierError> {
        self.db.ping().await?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AtelierError> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, user: UserId) -> Result<ConversationState, AtelierError> {
        let Some(json) = sessions::load_state(&self.db, user, Utc::now()).await? else {
            return Ok(ConversationState::default());
        };
        match serde_json::from_str(&json) {
            Ok(state) => Ok(state),
            Err(e) => {
                // An unreadable row behaves like an expired one.
                warn!(user_id = %user, error = %e, "discarding unreadable conversation state");
                Ok(ConversationState::default())
            }
        }
    }

    async fn set(&self, user: UserId, state: &ConversationState) -> Result<(), AtelierError> {
        let json = serde_json::to_string(state).map_err(AtelierError::storage)?;
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AtelierError::Internal(format!("session ttl out of range: {e}")))?;
        sessions::store_state(&self.db, user, json, Utc::now() + ttl).await
    }

    async fn clear(&self, user: UserId) -> Result<(), AtelierError> {
        sessions::delete_state(&self.db, user).await
    }
}
