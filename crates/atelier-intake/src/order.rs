// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order creation.
//!
//! Reads the finished conversation, resolves the material, prices and
//! persists the order, confirms it to the customer, queues the staff
//! notifications and clears the conversation. Nothing is written unless
//! every step up to the insert succeeds, and the conversation is kept on
//! failure so the user can retry without re-entering their answers.
//!
//! Each conversation carries an order key that is stored before the first
//! insert attempt. The repository inserts at most one row per key, so a retry
//! after a lost insert result or a failed session clear cannot create a
//! second order.

use chrono::Utc;
use metrics::counter;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use atelier_core::AtelierError;
use atelier_core::types::{ConversationState, Keyboard, Material, NewOrder, Order, UserId};
use atelier_pricing::{PricingError, PricingParams, compute_price};

use crate::notify::NotificationJob;
use crate::prompts;
use crate::service::IntakeService;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("conversation state unavailable: {0}")]
    StateUnavailable(String),

    #[error("order dimensions missing or not positive")]
    InvalidDimensions,

    #[error("no material could be resolved for the order")]
    NoTextureSelected,

    #[error("pricing failed: {0}")]
    Pricing(#[from] PricingError),

    #[error("failed to persist order: {0}")]
    Persistence(#[source] AtelierError),
}

impl OrderError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::StateUnavailable(_) => {
                "Не удалось получить данные заказа. Пожалуйста, попробуйте ещё раз или начните заново: /start"
            }
            Self::InvalidDimensions => {
                "Размеры изделия не указаны. Пожалуйста, отмените ввод даты и введите размеры заново."
            }
            Self::NoTextureSelected => {
                "Не выбран материал. Пожалуйста, вернитесь назад и выберите материал из каталога."
            }
            Self::Pricing(_) => "Не удалось рассчитать стоимость заказа. Пожалуйста, попробуйте позже.",
            Self::Persistence(_) => "Ошибка при оформлении заказа. Пожалуйста, попробуйте позже.",
        }
    }

    pub(crate) fn log(&self, user: UserId) {
        match self {
            Self::StateUnavailable(_) | Self::Persistence(_) => {
                error!(user_id = %user, error = %self, "order creation failed");
            }
            Self::InvalidDimensions | Self::NoTextureSelected | Self::Pricing(_) => {
                warn!(user_id = %user, error = %self, "order creation aborted");
            }
        }
    }
}

impl IntakeService {
    /// Creates the order for the user's finished conversation.
    ///
    /// `phone` must already be normalized and validated. `display_name` is
    /// used in the staff channel notice.
    pub async fn create_order(
        &self,
        user: UserId,
        phone: &str,
        display_name: &str,
    ) -> Result<Order, OrderError> {
        let mut state = self
            .load(user)
            .await
            .map_err(|e| OrderError::StateUnavailable(e.to_string()))?;
        if state.is_empty() {
            return Err(OrderError::StateUnavailable("session expired".into()));
        }

        let (width, height) = match (state.width_cm, state.height_cm) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(OrderError::InvalidDimensions),
        };

        let material = self
            .resolve_material(&state)
            .await
            .ok_or(OrderError::NoTextureSelected)?;

        let params = PricingParams::new(&self.pricing, material.price_per_dm2);
        let breakdown = compute_price(width, height, &params)?;

        let order_key = match &state.order_key {
            Some(key) => key.clone(),
            None => {
                let key = Uuid::new_v4().to_string();
                state.order_key = Some(key.clone());
                self.save(user, &state)
                    .await
                    .map_err(|e| OrderError::StateUnavailable(e.to_string()))?;
                key
            }
        };

        let new_order = NewOrder {
            order_key,
            user_id: user,
            width_cm: width,
            height_cm: height,
            texture_id: material.id,
            texture_name: material.name,
            price_per_dm2: material.price_per_dm2,
            breakdown,
            contact: phone.to_string(),
            delivery_date: state.date,
            created_at: Utc::now(),
        };
        let saved = self
            .budget
            .run(self.repo.save_order(&new_order))
            .await
            .map_err(OrderError::Persistence)?;
        let order = if saved.inserted {
            let order = Order::from_new(saved.id, new_order);
            counter!("atelier_orders_created_total").increment(1);
            info!(
                order_id = %order.id,
                user_id = %user,
                price = order.breakdown.final_price,
                "order created"
            );
            order
        } else {
            info!(
                order_id = %saved.id,
                user_id = %user,
                "order already recorded for this conversation"
            );
            match self.budget.run(self.repo.get_order_by_id(saved.id)).await {
                Ok(Some(order)) => order,
                _ => Order::from_new(saved.id, new_order),
            }
        };

        // Everything below is best effort: the order is already committed.
        if let Err(e) = self
            .send(user, &prompts::order_confirmation(&order), Keyboard::Remove)
            .await
        {
            warn!(order_id = %order.id, error = %e, "failed to send order confirmation");
        }
        // Also on replay: the earlier attempt may have committed without
        // getting as far as queueing the notice.
        self.notifications.enqueue(NotificationJob::NewOrder {
            order: order.clone(),
            display_name: display_name.to_string(),
        });
        if let Err(e) = self.budget.run(self.repo.update_user_phone(user, phone)).await {
            warn!(user_id = %user, error = %e, "failed to remember contact phone");
        }
        if let Err(e) = self.clear(user).await {
            error!(user_id = %user, error = %e, "failed to clear conversation after order");
        }
        Ok(order)
    }

    /// Material by `texture_id`, falling back to a catalog name match on `service`.
    async fn resolve_material(&self, state: &ConversationState) -> Option<Material> {
        if let Some(id) = &state.texture_id {
            match self.budget.run(self.repo.get_texture_by_id(id)).await {
                Ok(Some(material)) => return Some(material),
                Ok(None) => debug!(texture_id = %id, "texture no longer in catalog"),
                Err(e) => warn!(texture_id = %id, error = %e, "texture lookup failed"),
            }
        }
        let name = state.service.as_deref()?;
        match self.budget.run(self.repo.get_texture_by_name(name)).await {
            Ok(material) => material,
            Err(e) => {
                warn!(service = name, error = %e, "texture lookup by name failed");
                None
            }
        }
    }
}
