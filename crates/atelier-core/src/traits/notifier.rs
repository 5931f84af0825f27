// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier trait for staff notices and spreadsheet exports.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::AtelierError;
use crate::types::{Order, OrderStatus};

/// Formats and delivers staff-facing notices and order exports.
///
/// Every method is called from the background notification worker; failures
/// are logged there and never reach the customer.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Tells administrators about a new order, with status controls and its export.
    async fn notify_admin(&self, order: &Order) -> Result<(), AtelierError>;

    /// Posts a short notice about a new order to the staff channel.
    async fn notify_channel(&self, order: &Order, display_name: &str) -> Result<(), AtelierError>;

    /// Tells the administrators and the customer that an order changed status.
    async fn notify_status_change(
        &self,
        order: &Order,
        previous: OrderStatus,
    ) -> Result<(), AtelierError>;

    /// Posts a notice that a user accepted the privacy agreement.
    async fn notify_privacy_agreement(&self, display_name: &str) -> Result<(), AtelierError>;

    async fn export_order(&self, order: &Order) -> Result<PathBuf, AtelierError>;

    async fn export_all_orders(&self) -> Result<PathBuf, AtelierError>;
}
