// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process [`SessionStore`] for development and tests.
//!
//! State does not survive a restart. TTL is honoured on read.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use atelier_core::types::{AdapterType, ConversationState, HealthStatus, UserId};
use atelier_core::{AtelierError, PluginAdapter, SessionStore};

pub struct MemorySessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<UserId, (ConversationState, Instant)>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live (unexpired) sessions.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PluginAdapter for MemorySessionStore {
    fn name(&self) -> &str {
        "memory-sessions"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionStore
    }

    async fn health_check(&self) -> Result<HealthStatus, AtelierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AtelierError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user: UserId) -> Result<ConversationState, AtelierError> {
        let entries = self.entries.read().await;
        Ok(match entries.get(&user) {
            Some((state, expires)) if *expires > Instant::now() => state.clone(),
            _ => ConversationState::default(),
        })
    }

    async fn set(&self, user: UserId, state: &ConversationState) -> Result<(), AtelierError> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(user, (state.clone(), now + self.ttl));
        Ok(())
    }

    async fn clear(&self, user: UserId) -> Result<(), AtelierError> {
        self.entries.write().await.remove(&user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::types::Step;

    #[tokio::test]
    async fn basic_operations() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let state = ConversationState::at(Step::PhoneNumber);

        store.set(UserId(1), &state).await.unwrap();
        assert_eq!(store.get(UserId(1)).await.unwrap(), state);
        assert_eq!(store.len().await, 1);

        store.clear(UserId(1)).await.unwrap();
        assert!(store.get(UserId(1)).await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemorySessionStore::new(Duration::from_secs(24 * 60 * 60));
        store
            .set(UserId(1), &ConversationState::at(Step::Dimensions))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(23 * 60 * 60)).await;
        assert!(!store.get(UserId(1)).await.unwrap().is_empty());

        tokio::time::advance(Duration::from_secs(2 * 60 * 60)).await;
        assert!(store.get(UserId(1)).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn set_restarts_ttl() {
        let store = MemorySessionStore::new(Duration::from_secs(10));
        let state = ConversationState::at(Step::Dimensions);
        store.set(UserId(1), &state).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        store.set(UserId(1), &state).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.get(UserId(1)).await.unwrap(), state);
    }
}
