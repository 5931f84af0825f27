// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the real intake service against a temp SQLite
//! database (seeded catalog included), a mock gateway, the gateway notifier
//! and a running notification worker.

use std::sync::Arc;
use std::time::Duration;

use atelier_config::model::{AtelierConfig, SessionBackend, StorageConfig};
use atelier_core::types::{ConversationState, InboundEvent, Order, UserId};
use atelier_core::{AtelierError, CallBudget, OrderRepository, SessionStore};
use atelier_intake::{
    Collaborators, Dispatcher, GatewayNotifier, IntakeService, NotificationQueue,
    NotificationWorker,
};
use atelier_storage::{MemorySessionStore, SpreadsheetExporter, SqliteSessionStore, SqliteStorage};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::faulty_repository::FaultyRepository;
use crate::faulty_sessions::FaultySessionStore;
use crate::mock_gateway::MockGateway;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    admin_id: Option<i64>,
    channel_id: Option<i64>,
    backend: SessionBackend,
    session_ttl: Duration,
    queue_capacity: usize,
    default_material_price: Option<f64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            admin_id: None,
            channel_id: None,
            backend: SessionBackend::Sqlite,
            session_ttl: Duration::from_secs(24 * 60 * 60),
            queue_capacity: 64,
            default_material_price: None,
        }
    }

    /// Registers `id` as the primary admin chat.
    pub fn with_admin(mut self, id: i64) -> Self {
        self.admin_id = Some(id);
        self
    }

    /// Sets the staff channel.
    pub fn with_channel(mut self, id: i64) -> Self {
        self.channel_id = Some(id);
        self
    }

    /// Uses the in-memory session store instead of SQLite.
    pub fn with_memory_sessions(mut self) -> Self {
        self.backend = SessionBackend::Memory;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Overrides `pricing.default_material_price_per_dm2`.
    pub fn with_default_material_price(mut self, price: f64) -> Self {
        self.default_material_price = Some(price);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, AtelierError> {
        let temp_dir = tempfile::TempDir::new().map_err(AtelierError::storage)?;
        let db_path = temp_dir.path().join("test.db");
        let reports_dir = temp_dir.path().join("reports");

        let mut config = AtelierConfig::default();
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        config.reports.directory = reports_dir.to_string_lossy().to_string();
        config.admin.chat_id = self.admin_id;
        config.admin.channel_id = self.channel_id;
        config.session.backend = self.backend;
        config.session.ttl_secs = self.session_ttl.as_secs().max(1);
        config.notifications.queue_capacity = self.queue_capacity;
        if let Some(price) = self.default_material_price {
            config.pricing.default_material_price_per_dm2 = price;
        }

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let inner: Arc<dyn SessionStore> = match self.backend {
            SessionBackend::Sqlite => Arc::new(SqliteSessionStore::new(
                storage.database()?,
                self.session_ttl,
            )),
            SessionBackend::Memory => Arc::new(MemorySessionStore::new(self.session_ttl)),
        };
        let sessions = Arc::new(FaultySessionStore::new(inner));
        let repository = Arc::new(FaultyRepository::new(storage.clone()));
        let gateway = Arc::new(MockGateway::new());

        let cancel = CancellationToken::new();
        let budget = CallBudget::new(Duration::from_secs(5), cancel.clone());

        let notifier = Arc::new(GatewayNotifier::new(
            gateway.clone(),
            repository.clone(),
            SpreadsheetExporter::new(&reports_dir),
            config.admin.clone(),
            config.pricing.clone(),
            // Not tied to shutdown so queued notices still drain.
            CallBudget::with_timeout(Duration::from_secs(5)),
        ));
        let (notifications, rx) = NotificationQueue::new(config.notifications.queue_capacity);
        let worker = tokio::spawn(NotificationWorker::new(rx, notifier.clone()).run(cancel.clone()));

        let service = Arc::new(IntakeService::new(
            &config,
            Collaborators {
                sessions: sessions.clone(),
                repository: repository.clone(),
                gateway: gateway.clone(),
                notifier,
                notifications,
            },
            budget,
        ));

        Ok(TestHarness {
            service,
            gateway,
            repository,
            sessions,
            storage,
            config,
            cancel,
            worker: Some(worker),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock gateway and temp storage.
pub struct TestHarness {
    /// The intake service under test.
    pub service: Arc<IntakeService>,
    /// The mock gateway capturing everything the bot sends.
    pub gateway: Arc<MockGateway>,
    /// Repository wrapper with switchable faults.
    pub repository: Arc<FaultyRepository>,
    /// Session store wrapper with switchable faults.
    pub sessions: Arc<FaultySessionStore>,
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    pub config: AtelierConfig,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Handles one event to completion.
    pub async fn send(&self, event: InboundEvent) {
        self.service.handle(event).await;
    }

    pub async fn send_text(&self, user: i64, text: &str) {
        self.send(InboundEvent::text(UserId(user), text)).await;
    }

    pub async fn state(&self, user: i64) -> ConversationState {
        self.sessions
            .get(UserId(user))
            .await
            .unwrap_or_default()
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.storage.list_orders().await.unwrap_or_default()
    }

    /// Last text the bot sent to `user`.
    pub async fn last_reply(&self, user: i64) -> String {
        self.gateway.last_text_to(user).await.unwrap_or_default()
    }

    /// A dispatcher reading from the mock gateway.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.gateway.clone(), self.service.clone())
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the notification worker after it drains the queue.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}
