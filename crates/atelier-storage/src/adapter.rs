// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`OrderRepository`] trait.

use async_trait::async_trait;
use chrono::{Local, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use atelier_config::model::StorageConfig;
use atelier_core::types::{
    AdapterType, HealthStatus, Material, NewOrder, Order, OrderId, OrderStatus, SavedOrder,
    Statistics, UserAgreement, UserId,
};
use atelier_core::{AtelierError, OrderRepository, PluginAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed order repository.
///
/// The database is opened by [`SqliteStorage::initialize`]; every other
/// method fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. Nothing is opened until `initialize`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Opens the database and runs migrations.
    pub async fn initialize(&self) -> Result<(), AtelierError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| AtelierError::storage("storage already initialized"))?;
        info!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Checkpoints the WAL. Safe to call on an uninitialized storage.
    pub async fn close(&self) -> Result<(), AtelierError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
        }
        Ok(())
    }

    /// Shared database handle, for the SQLite session store.
    pub fn database(&self) -> Result<Database, AtelierError> {
        self.db().cloned()
    }

    fn db(&self) -> Result<&Database, AtelierError> {
        self.db
            .get()
            .ok_or_else(|| AtelierError::storage("storage not initialized, call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Repository
    }

    async fn health_check(&self) -> Result<HealthStatus, AtelierError> {
        match self.db.get() {
            Some(db) => {
                db.ping().await?;
                Ok(HealthStatus::Healthy)
            }
            None => Ok(HealthStatus::Unhealthy("database not opened".into())),
        }
    }

    async fn shutdown(&self) -> Result<(), AtelierError> {
        self.close().await?;
        debug!("sqlite storage shut down");
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for SqliteStorage {
    async fn save_order(&self, order: &NewOrder) -> Result<SavedOrder, AtelierError> {
        queries::orders::insert_order(self.db()?, order).await
    }

    async fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, AtelierError> {
        queries::orders::get_order(self.db()?, id).await
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<bool, AtelierError> {
        queries::orders::update_status(self.db()?, id, status).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, AtelierError> {
        queries::orders::list_orders(self.db()?, None, None).await
    }

    async fn list_orders_for_user(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<Order>, AtelierError> {
        queries::orders::list_orders(self.db()?, Some(user), Some(limit)).await
    }

    async fn get_statistics(&self) -> Result<Statistics, AtelierError> {
        queries::orders::statistics(self.db()?, Local::now()).await
    }

    async fn get_texture_by_id(&self, id: &str) -> Result<Option<Material>, AtelierError> {
        queries::textures::get_texture(self.db()?, id).await
    }

    async fn get_texture_by_name(&self, name: &str) -> Result<Option<Material>, AtelierError> {
        queries::textures::find_texture_by_name(self.db()?, name).await
    }

    async fn list_textures(&self) -> Result<Vec<Material>, AtelierError> {
        queries::textures::list_textures(self.db()?, true).await
    }

    async fn save_user_agreement(&self, user: UserId) -> Result<(), AtelierError> {
        queries::users::save_agreement(self.db()?, user, Utc::now()).await
    }

    async fn get_user_agreement(
        &self,
        user: UserId,
    ) -> Result<Option<UserAgreement>, AtelierError> {
        queries::users::get_agreement(self.db()?, user).await
    }

    async fn update_user_phone(&self, user: UserId, phone: &str) -> Result<(), AtelierError> {
        queries::users::update_phone(self.db()?, user, phone, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use atelier_core::types::PriceBreakdown;
    use chrono::{Duration, FixedOffset, TimeZone};

    static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

    async fn open_storage() -> (SqliteStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        (storage, dir)
    }

    fn sample_order(user: i64, price: f64) -> NewOrder {
        NewOrder {
            order_key: format!("test-{}", NEXT_KEY.fetch_add(1, Ordering::Relaxed)),
            user_id: UserId(user),
            width_cm: 30,
            height_cm: 40,
            texture_id: "11111111-1111-1111-1111-111111111111".into(),
            texture_name: "Натуральная кожа".into(),
            price_per_dm2: 25.0,
            breakdown: PriceBreakdown {
                area_dm2: 12.0,
                material_cost: 300.0,
                processing_cost: 375.0,
                total_cost: 675.0,
                final_price: price,
                commission: price * 0.03,
                tax: price * 0.06,
                net_revenue: price - price * 0.03 - price * 0.06,
                profit: price - price * 0.03 - price * 0.06 - 675.0,
            },
            contact: "+79161234567".into(),
            delivery_date: Some("01.01.2030".into()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn uninitialized_storage_errors() {
        let storage = SqliteStorage::new(StorageConfig::default());
        assert!(storage.list_orders().await.is_err());
        assert_eq!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy("database not opened".into())
        );
    }

    #[tokio::test]
    async fn double_initialize_fails() {
        let (storage, _dir) = open_storage().await;
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn save_and_read_back_order() {
        let (storage, _dir) = open_storage().await;
        let new = sample_order(7, 1687.5);
        let id = storage.save_order(&new).await.unwrap().id;
        let order = storage.get_order_by_id(id).await.unwrap().unwrap();

        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.user_id, UserId(7));
        assert_eq!(order.width_cm, 30);
        assert_eq!(order.breakdown, new.breakdown);
        assert_eq!(order.delivery_date.as_deref(), Some("01.01.2030"));
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let (storage, _dir) = open_storage().await;
        let a = storage.save_order(&sample_order(1, 100.0)).await.unwrap();
        let b = storage.save_order(&sample_order(1, 100.0)).await.unwrap();
        assert!(a.inserted && b.inserted);
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn same_order_key_inserts_once() {
        let (storage, _dir) = open_storage().await;
        let new = sample_order(3, 100.0);
        let first = storage.save_order(&new).await.unwrap();

        let mut again = sample_order(3, 999.0);
        again.order_key = new.order_key.clone();
        let second = storage.save_order(&again).await.unwrap();

        assert!(first.inserted);
        assert_eq!(second, SavedOrder { id: first.id, inserted: false });
        let orders = storage.list_orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert!((orders[0].breakdown.final_price - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn missing_order_is_none() {
        let (storage, _dir) = open_storage().await;
        assert!(storage.get_order_by_id(OrderId(999)).await.unwrap().is_none());
        assert!(!storage.update_status(OrderId(999), OrderStatus::Completed).await.unwrap());
    }

    #[tokio::test]
    async fn status_update_changes_only_status() {
        let (storage, _dir) = open_storage().await;
        let id = storage.save_order(&sample_order(1, 100.0)).await.unwrap().id;
        let before = storage.get_order_by_id(id).await.unwrap().unwrap();

        assert!(storage.update_status(id, OrderStatus::Processing).await.unwrap());
        let after = storage.get_order_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.status, OrderStatus::Processing);
        assert_eq!(Order { status: OrderStatus::New, ..after }, before);
    }

    #[tokio::test]
    async fn list_for_user_is_newest_first_and_limited() {
        let (storage, _dir) = open_storage().await;
        for _ in 0..3 {
            storage.save_order(&sample_order(5, 10.0)).await.unwrap();
        }
        storage.save_order(&sample_order(6, 10.0)).await.unwrap();

        let mine = storage.list_orders_for_user(UserId(5), 2).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].id > mine[1].id);
        assert_eq!(storage.list_orders().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn catalog_is_seeded() {
        let (storage, _dir) = open_storage().await;
        let textures = storage.list_textures().await.unwrap();
        assert_eq!(textures.len(), 3);

        let suede = storage
            .get_texture_by_id("33333333-3333-3333-3333-333333333333")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(suede.name, "Замша");
        assert!((suede.price_per_dm2 - 30.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn texture_name_lookup_ignores_case() {
        let (storage, _dir) = open_storage().await;
        let m = storage
            .get_texture_by_name("  натуральная КОЖА ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.id, "11111111-1111-1111-1111-111111111111");
        assert!(storage.get_texture_by_name("Бархат").await.unwrap().is_none());
        assert!(storage.get_texture_by_name("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn agreement_keeps_first_time_and_tracks_phone() {
        let (storage, _dir) = open_storage().await;
        let user = UserId(11);
        assert!(storage.get_user_agreement(user).await.unwrap().is_none());

        storage.save_user_agreement(user).await.unwrap();
        let first = storage.get_user_agreement(user).await.unwrap().unwrap();
        assert!(first.phone.is_none());

        storage.save_user_agreement(user).await.unwrap();
        storage.update_user_phone(user, "+79161234567").await.unwrap();
        let second = storage.get_user_agreement(user).await.unwrap().unwrap();
        assert_eq!(second.agreed_at, first.agreed_at);
        assert_eq!(second.phone.as_deref(), Some("+79161234567"));
    }

    #[tokio::test]
    async fn statistics_bucket_by_age_and_status() {
        let (storage, _dir) = open_storage().await;
        let now = Utc::now();

        let mut old = sample_order(1, 1000.0);
        old.created_at = now - Duration::days(20);
        storage.save_order(&old).await.unwrap();

        let mut ancient = sample_order(1, 500.0);
        ancient.created_at = now - Duration::days(60);
        let ancient_id = storage.save_order(&ancient).await.unwrap().id;
        storage.update_status(ancient_id, OrderStatus::Completed).await.unwrap();

        storage.save_order(&sample_order(2, 200.0)).await.unwrap();

        let stats = queries::orders::statistics(storage.db().unwrap(), now + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(stats.total.orders, 3);
        assert!((stats.total.revenue - 1700.0).abs() < 1e-9);
        assert_eq!(stats.week.orders, 1);
        assert_eq!(stats.month.orders, 2);
        assert!((stats.month.revenue - 1200.0).abs() < 1e-9);
        assert!(stats.today.orders <= 1);
        assert!(stats.by_status.contains(&(OrderStatus::New, 2)));
        assert!(stats.by_status.contains(&(OrderStatus::Completed, 1)));
        assert!(stats.by_status.contains(&(OrderStatus::Cancelled, 0)));
    }

    #[tokio::test]
    async fn today_starts_at_local_midnight() {
        let (storage, _dir) = open_storage().await;
        let moscow = FixedOffset::east_opt(3 * 3600).unwrap();
        // 01:30 local on 2 March is still 1 March in UTC.
        let now = moscow.with_ymd_and_hms(2030, 3, 2, 10, 0, 0).unwrap();

        let mut early = sample_order(1, 100.0);
        early.created_at = Utc.with_ymd_and_hms(2030, 3, 1, 22, 30, 0).unwrap();
        storage.save_order(&early).await.unwrap();

        let mut yesterday = sample_order(1, 50.0);
        yesterday.created_at = Utc.with_ymd_and_hms(2030, 3, 1, 20, 30, 0).unwrap();
        storage.save_order(&yesterday).await.unwrap();

        let stats = queries::orders::statistics(storage.db().unwrap(), now)
            .await
            .unwrap();
        assert_eq!(stats.today.orders, 1);
        assert!((stats.today.revenue - 100.0).abs() < 1e-9);
        assert_eq!(stats.total.orders, 2);
    }
}
