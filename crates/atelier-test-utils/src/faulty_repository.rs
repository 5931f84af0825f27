// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository wrapper with switchable faults, for failure-path tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::debug;

use atelier_core::types::{
    AdapterType, HealthStatus, Material, NewOrder, Order, OrderId, OrderStatus, SavedOrder,
    Statistics, UserAgreement, UserId,
};
use atelier_core::{AtelierError, OrderRepository, PluginAdapter};

/// Delegates to an inner repository unless a fault is switched on.
pub struct FaultyRepository {
    inner: Arc<dyn OrderRepository>,
    fail_saves: AtomicBool,
    lose_save_results: AtomicBool,
    fail_texture_lookups: AtomicBool,
}

impl FaultyRepository {
    pub fn new(inner: Arc<dyn OrderRepository>) -> Self {
        Self {
            inner,
            fail_saves: AtomicBool::new(false),
            lose_save_results: AtomicBool::new(false),
            fail_texture_lookups: AtomicBool::new(false),
        }
    }

    /// Makes `save_order` fail.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Lets `save_order` commit but report a failure, like a call that
    /// timed out after the write went through.
    pub fn lose_save_results(&self, lose: bool) {
        self.lose_save_results.store(lose, Ordering::SeqCst);
    }

    /// Makes `get_texture_by_id` and `get_texture_by_name` fail.
    pub fn fail_texture_lookups(&self, fail: bool) {
        self.fail_texture_lookups.store(fail, Ordering::SeqCst);
    }

    fn texture_fault(&self) -> Result<(), AtelierError> {
        if self.fail_texture_lookups.load(Ordering::SeqCst) {
            debug!("injecting texture lookup failure");
            return Err(AtelierError::storage("injected texture lookup failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for FaultyRepository {
    fn name(&self) -> &str {
        "faulty-repository"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Repository
    }

    async fn health_check(&self) -> Result<HealthStatus, AtelierError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), AtelierError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl OrderRepository for FaultyRepository {
    async fn save_order(&self, order: &NewOrder) -> Result<SavedOrder, AtelierError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            debug!("injecting save failure");
            return Err(AtelierError::storage("injected save failure"));
        }
        let saved = self.inner.save_order(order).await?;
        if self.lose_save_results.load(Ordering::SeqCst) {
            debug!(order_id = %saved.id, "dropping save result after commit");
            return Err(AtelierError::Timeout {
                duration: std::time::Duration::from_secs(5),
            });
        }
        Ok(saved)
    }

    async fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, AtelierError> {
        self.inner.get_order_by_id(id).await
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<bool, AtelierError> {
        self.inner.update_status(id, status).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, AtelierError> {
        self.inner.list_orders().await
    }

    async fn list_orders_for_user(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<Order>, AtelierError> {
        self.inner.list_orders_for_user(user, limit).await
    }

    async fn get_statistics(&self) -> Result<Statistics, AtelierError> {
        self.inner.get_statistics().await
    }

    async fn get_texture_by_id(&self, id: &str) -> Result<Option<Material>, AtelierError> {
        self.texture_fault()?;
        self.inner.get_texture_by_id(id).await
    }

    async fn get_texture_by_name(&self, name: &str) -> Result<Option<Material>, AtelierError> {
        self.texture_fault()?;
        self.inner.get_texture_by_name(name).await
    }

    async fn list_textures(&self) -> Result<Vec<Material>, AtelierError> {
        self.inner.list_textures().await
    }

    async fn save_user_agreement(&self, user: UserId) -> Result<(), AtelierError> {
        self.inner.save_user_agreement(user).await
    }

    async fn get_user_agreement(
        &self,
        user: UserId,
    ) -> Result<Option<UserAgreement>, AtelierError> {
        self.inner.get_user_agreement(user).await
    }

    async fn update_user_phone(&self, user: UserId, phone: &str) -> Result<(), AtelierError> {
        self.inner.update_user_phone(user, phone).await
    }
}
