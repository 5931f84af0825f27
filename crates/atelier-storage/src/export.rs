// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spreadsheet (CSV) export of orders for administrators.
//!
//! File names carry a minute-resolution timestamp:
//! `order_<id>_<YYYYMMDD_HHMM>.csv` for one order and
//! `orders_<YYYYMMDD_HHMM>.csv` for the full list.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use atelier_core::AtelierError;
use atelier_core::types::Order;

const HEADERS: [&str; 17] = [
    "ID",
    "User ID",
    "Width",
    "Height",
    "Texture ID",
    "Texture Name",
    "Price",
    "Material Cost",
    "Processing Cost",
    "Total Cost",
    "Commission",
    "Tax",
    "Net Revenue",
    "Profit",
    "Contact",
    "Status",
    "Created At",
];

/// Writes order exports into a fixed directory.
#[derive(Debug, Clone)]
pub struct SpreadsheetExporter {
    dir: PathBuf,
}

impl SpreadsheetExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Exports a single order.
    pub async fn export_order(&self, order: &Order) -> Result<PathBuf, AtelierError> {
        let name = format!("order_{}_{}.csv", order.id, stamp(Utc::now()));
        self.write(name, vec![order.clone()]).await
    }

    /// Exports every order given, in order.
    pub async fn export_all(&self, orders: Vec<Order>) -> Result<PathBuf, AtelierError> {
        let name = format!("orders_{}.csv", stamp(Utc::now()));
        self.write(name, orders).await
    }

    async fn write(&self, name: String, orders: Vec<Order>) -> Result<PathBuf, AtelierError> {
        let path = self.dir.join(name);
        let dir = self.dir.clone();
        let target = path.clone();
        let rows = orders.len();
        tokio::task::spawn_blocking(move || write_csv(&dir, &target, &orders))
            .await
            .map_err(|e| AtelierError::Internal(format!("export task failed: {e}")))??;
        debug!(path = %path.display(), rows, "orders exported");
        Ok(path)
    }
}

fn stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M").to_string()
}

fn write_csv(dir: &Path, path: &Path, orders: &[Order]) -> Result<(), AtelierError> {
    std::fs::create_dir_all(dir).map_err(AtelierError::storage)?;
    let mut writer = csv::Writer::from_path(path).map_err(AtelierError::storage)?;
    writer.write_record(HEADERS).map_err(AtelierError::storage)?;
    for order in orders {
        writer
            .write_record(record(order))
            .map_err(AtelierError::storage)?;
    }
    writer.flush().map_err(AtelierError::storage)?;
    Ok(())
}

fn record(order: &Order) -> [String; 17] {
    let b = &order.breakdown;
    [
        order.id.to_string(),
        order.user_id.to_string(),
        order.width_cm.to_string(),
        order.height_cm.to_string(),
        order.texture_id.clone(),
        order.texture_name.clone(),
        format!("{:.2}", b.final_price),
        format!("{:.2}", b.material_cost),
        format!("{:.2}", b.processing_cost),
        format!("{:.2}", b.total_cost),
        format!("{:.2}", b.commission),
        format!("{:.2}", b.tax),
        format!("{:.2}", b.net_revenue),
        format!("{:.2}", b.profit),
        order.contact.clone(),
        order.status.to_string(),
        order.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::types::{OrderId, OrderStatus, PriceBreakdown, UserId};
    use chrono::TimeZone;

    fn order(id: i64) -> Order {
        Order {
            id: OrderId(id),
            user_id: UserId(77),
            width_cm: 80,
            height_cm: 20,
            texture_id: "tex-1".into(),
            texture_name: "Натуральная кожа".into(),
            price_per_dm2: 25.0,
            breakdown: PriceBreakdown {
                area_dm2: 16.0,
                material_cost: 400.0,
                processing_cost: 500.0,
                total_cost: 900.0,
                final_price: 2250.0,
                commission: 67.5,
                tax: 135.0,
                net_revenue: 2047.5,
                profit: 1147.5,
            },
            contact: "+79161234567".into(),
            delivery_date: None,
            status: OrderStatus::New,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn single_order_export_has_header_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SpreadsheetExporter::new(dir.path().join("reports"));

        let path = exporter.export_order(&order(5)).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("order_5_"), "{name}");
        assert!(name.ends_with(".csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, HEADERS);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "5");
        assert_eq!(&rows[0][5], "Натуральная кожа");
        assert_eq!(&rows[0][6], "2250.00");
        assert_eq!(&rows[0][15], "new");
        assert_eq!(&rows[0][16], "2026-03-01 12:30:00");
    }

    #[tokio::test]
    async fn full_export_keeps_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SpreadsheetExporter::new(dir.path());

        let path = exporter
            .export_all(vec![order(3), order(2), order(1)])
            .await
            .unwrap();
        assert!(
            path.file_name()
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("orders_")
        );
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let ids: Vec<String> = reader.records().map(|r| r.unwrap()[0].to_string()).collect();
        assert_eq!(ids, ["3", "2", "1"]);
    }

    #[tokio::test]
    async fn empty_export_is_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SpreadsheetExporter::new(dir.path());
        let path = exporter.export_all(Vec::new()).await.unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 0);
    }

    #[test]
    fn stamp_is_minute_resolution() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 59).unwrap();
        assert_eq!(stamp(at), "20260102_0304");
    }
}
