// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `atelier serve` command implementation.
//!
//! Wires storage, the session store, the Telegram gateway, the notification
//! worker and the intake service, then runs the dispatcher until SIGINT or
//! SIGTERM. Shutdown drains in-flight updates and queued notifications
//! before storage is closed.

use std::sync::Arc;
use std::time::Duration;

use atelier_config::model::{AtelierConfig, SessionBackend};
use atelier_core::error::AtelierError;
use atelier_core::{CallBudget, MessagingGateway, PluginAdapter, SessionStore};
use atelier_intake::{
    Collaborators, Dispatcher, GatewayNotifier, IntakeService, NotificationQueue,
    NotificationWorker, install_signal_handler,
};
use atelier_storage::{MemorySessionStore, SpreadsheetExporter, SqliteSessionStore, SqliteStorage};
use atelier_telegram::TelegramGateway;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How often expired SQLite sessions are deleted.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Runs the `atelier serve` command.
pub async fn run_serve(config: AtelierConfig) -> Result<(), AtelierError> {
    info!("starting atelier serve");

    let gateway = Arc::new(TelegramGateway::new(&config.telegram)?);

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let ttl = Duration::from_secs(config.session.ttl_secs);
    let timeout = Duration::from_secs(config.bot.request_timeout_secs);
    let cancel = install_signal_handler();

    let sessions: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Sqlite => {
            let store = Arc::new(SqliteSessionStore::new(storage.database()?, ttl));
            tokio::spawn(purge_sessions(store.clone(), cancel.clone()));
            store
        }
        SessionBackend::Memory => Arc::new(MemorySessionStore::new(ttl)),
    };
    info!(backend = sessions.name(), ttl_secs = ttl.as_secs(), "session store ready");

    // The notifier budget is not tied to shutdown so queued notices still drain.
    let notifier = Arc::new(GatewayNotifier::new(
        gateway.clone(),
        storage.clone(),
        SpreadsheetExporter::new(&config.reports.directory),
        config.admin.clone(),
        config.pricing.clone(),
        CallBudget::with_timeout(timeout),
    ));
    let (notifications, rx) = NotificationQueue::new(config.notifications.queue_capacity);
    let worker = tokio::spawn(NotificationWorker::new(rx, notifier.clone()).run(cancel.clone()));

    let service = Arc::new(IntakeService::new(
        &config,
        Collaborators {
            sessions: sessions.clone(),
            repository: storage.clone(),
            gateway: gateway.clone(),
            notifier,
            notifications,
        },
        CallBudget::new(timeout, cancel.clone()),
    ));

    if config.admin.admin_chats().is_empty() {
        warn!("no admin chats configured; new-order notices go to the channel only");
    }

    gateway.connect().await?;
    Dispatcher::new(gateway.clone(), service).run(cancel).await?;

    if let Err(e) = worker.await {
        warn!(error = %e, "notification worker ended abnormally");
    }
    gateway.shutdown().await?;
    sessions.shutdown().await?;
    storage.close().await?;

    info!("atelier serve shutdown complete");
    Ok(())
}

/// Deletes expired session rows until shutdown.
async fn purge_sessions(store: Arc<SqliteSessionStore>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => debug!(purged, "expired sessions purged"),
                Err(e) => warn!(error = %e, "session purge failed"),
            },
            _ = cancel.cancelled() => break,
        }
    }
}
