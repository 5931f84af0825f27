// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `atelier export` and `atelier stats`: offline reports against the database.

use std::path::PathBuf;

use atelier_config::model::AtelierConfig;
use atelier_core::error::AtelierError;
use atelier_core::types::OrderId;
use atelier_core::OrderRepository;
use atelier_intake::admin::format_statistics;
use atelier_storage::{SpreadsheetExporter, SqliteStorage};
use tracing::info;

async fn open_storage(config: &AtelierConfig) -> Result<SqliteStorage, AtelierError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(storage)
}

/// Writes one order, or every order, to a CSV file under `reports.directory`.
pub async fn run_export(
    config: &AtelierConfig,
    order: Option<i64>,
) -> Result<PathBuf, AtelierError> {
    let storage = open_storage(config).await?;
    let exporter = SpreadsheetExporter::new(&config.reports.directory);
    let path = match order {
        Some(id) => {
            let order = storage
                .get_order_by_id(OrderId(id))
                .await?
                .ok_or_else(|| AtelierError::Internal(format!("order #{id} not found")))?;
            exporter.export_order(&order).await?
        }
        None => exporter.export_all(storage.list_orders().await?).await?,
    };
    storage.close().await?;
    info!(path = %path.display(), "export written");
    Ok(path)
}

/// Renders the statistics report shown to admins by `/stats`.
pub async fn run_stats(config: &AtelierConfig) -> Result<String, AtelierError> {
    let storage = open_storage(config).await?;
    let stats = storage.get_statistics().await?;
    storage.close().await?;
    Ok(format_statistics(&stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir) -> AtelierConfig {
        let mut config = AtelierConfig::default();
        config.storage.database_path = dir.path().join("t.db").to_string_lossy().to_string();
        config.reports.directory = dir.path().join("reports").to_string_lossy().to_string();
        config
    }

    #[tokio::test]
    async fn export_of_empty_database_writes_header_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = run_export(&config(&dir), None).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("ID,User ID,"));
    }

    #[tokio::test]
    async fn export_of_missing_order_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = run_export(&config(&dir), Some(42)).await.unwrap_err();
        assert!(err.to_string().contains("#42"));
    }

    #[tokio::test]
    async fn stats_on_empty_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let text = run_stats(&config(&dir)).await.unwrap();
        assert!(text.contains("Всего заказов: 0"));
    }
}
