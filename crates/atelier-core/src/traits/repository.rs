// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order repository trait for durable orders, catalog, and user agreements.

use async_trait::async_trait;

use crate::error::AtelierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Material, NewOrder, Order, OrderId, OrderStatus, SavedOrder, Statistics, UserAgreement,
    UserId,
};

/// Durable storage for orders and the material catalog.
#[async_trait]
pub trait OrderRepository: PluginAdapter {
    /// Inserts an order and returns the id assigned to it. If an order with
    /// the same `order_key` exists, nothing is written and its id is returned
    /// with `inserted == false`.
    async fn save_order(&self, order: &NewOrder) -> Result<SavedOrder, AtelierError>;

    async fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, AtelierError>;

    /// Sets the status of an order. Returns `false` if no such order exists.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<bool, AtelierError>;

    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, AtelierError>;

    /// The most recent orders placed by `user`, newest first.
    async fn list_orders_for_user(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<Order>, AtelierError>;

    async fn get_statistics(&self) -> Result<Statistics, AtelierError>;

    // --- Catalog ---

    async fn get_texture_by_id(&self, id: &str) -> Result<Option<Material>, AtelierError>;

    /// Case-insensitive lookup by material name.
    async fn get_texture_by_name(&self, name: &str) -> Result<Option<Material>, AtelierError>;

    /// In-stock materials ordered by name.
    async fn list_textures(&self) -> Result<Vec<Material>, AtelierError>;

    // --- User agreements ---

    /// Records acceptance of the privacy agreement. Repeated calls keep the
    /// first acceptance time.
    async fn save_user_agreement(&self, user: UserId) -> Result<(), AtelierError>;

    async fn get_user_agreement(&self, user: UserId)
    -> Result<Option<UserAgreement>, AtelierError>;

    async fn update_user_phone(&self, user: UserId, phone: &str) -> Result<(), AtelierError>;
}
