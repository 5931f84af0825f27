// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session store wrapper with switchable faults.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::debug;

use atelier_core::types::{AdapterType, ConversationState, HealthStatus, UserId};
use atelier_core::{AtelierError, PluginAdapter, SessionStore};

/// Delegates to an inner store unless a fault is switched on.
pub struct FaultySessionStore {
    inner: Arc<dyn SessionStore>,
    fail_sets: AtomicBool,
    fail_clears: AtomicBool,
}

impl FaultySessionStore {
    pub fn new(inner: Arc<dyn SessionStore>) -> Self {
        Self {
            inner,
            fail_sets: AtomicBool::new(false),
            fail_clears: AtomicBool::new(false),
        }
    }

    /// Makes `set` fail.
    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    /// Makes `clear` fail, leaving the stored state in place.
    pub fn fail_clears(&self, fail: bool) {
        self.fail_clears.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for FaultySessionStore {
    fn name(&self) -> &str {
        "faulty-sessions"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionStore
    }

    async fn health_check(&self) -> Result<HealthStatus, AtelierError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), AtelierError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl SessionStore for FaultySessionStore {
    async fn get(&self, user: UserId) -> Result<ConversationState, AtelierError> {
        self.inner.get(user).await
    }

    async fn set(&self, user: UserId, state: &ConversationState) -> Result<(), AtelierError> {
        if self.fail_sets.load(Ordering::SeqCst) {
            debug!(user_id = %user, "injecting session write failure");
            return Err(AtelierError::storage("injected session write failure"));
        }
        self.inner.set(user, state).await
    }

    async fn clear(&self, user: UserId) -> Result<(), AtelierError> {
        if self.fail_clears.load(Ordering::SeqCst) {
            debug!(user_id = %user, "injecting session clear failure");
            return Err(AtelierError::storage("injected session clear failure"));
        }
        self.inner.clear(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use atelier_core::types::Step;
    use atelier_storage::MemorySessionStore;

    #[tokio::test]
    async fn faults_leave_inner_state_untouched() {
        let store = FaultySessionStore::new(Arc::new(MemorySessionStore::new(
            Duration::from_secs(60),
        )));
        let user = UserId(1);
        store
            .set(user, &ConversationState::at(Step::PhoneNumber))
            .await
            .unwrap();

        store.fail_clears(true);
        assert!(store.clear(user).await.is_err());
        store.fail_sets(true);
        assert!(store.set(user, &ConversationState::default()).await.is_err());
        assert_eq!(store.get(user).await.unwrap().step, Some(Step::PhoneNumber));

        store.fail_clears(false);
        store.clear(user).await.unwrap();
        assert!(store.get(user).await.unwrap().is_empty());
    }
}
