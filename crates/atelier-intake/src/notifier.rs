// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`Notifier`] that formats staff and customer notices and delivers them
//! through the messaging gateway.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use atelier_config::model::{AdminConfig, PricingConfig};
use atelier_core::types::{ChatId, InlineButton, Keyboard, Order, OrderId, OrderStatus};
use atelier_core::{AtelierError, CallBudget, MessagingGateway, Notifier, OrderRepository};
use atelier_pricing::format::breakdown_summary;
use atelier_pricing::money;
use atelier_storage::SpreadsheetExporter;

use crate::validators::format_phone;

pub struct GatewayNotifier {
    gateway: Arc<dyn MessagingGateway>,
    repo: Arc<dyn OrderRepository>,
    exporter: SpreadsheetExporter,
    admin: AdminConfig,
    pricing: PricingConfig,
    budget: CallBudget,
}

impl GatewayNotifier {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        repo: Arc<dyn OrderRepository>,
        exporter: SpreadsheetExporter,
        admin: AdminConfig,
        pricing: PricingConfig,
        budget: CallBudget,
    ) -> Self {
        Self {
            gateway,
            repo,
            exporter,
            admin,
            pricing,
            budget,
        }
    }

    async fn send(&self, chat: ChatId, text: &str, keyboard: Keyboard) -> Result<(), AtelierError> {
        self.budget
            .run(self.gateway.send_message(chat, text, keyboard))
            .await
            .map(drop)
    }

    /// Sends to every admin chat; returns the last failure, if any.
    async fn broadcast_admins(&self, text: &str, keyboard: Keyboard) -> Result<(), AtelierError> {
        let mut result = Ok(());
        for chat in self.admin.admin_chats() {
            if let Err(e) = self.send(ChatId(chat), text, keyboard.clone()).await {
                result = Err(e);
            }
        }
        result
    }

    fn admin_order_text(&self, order: &Order) -> String {
        let mut text = format!(
            "📦 Новый заказ #{}\n\n\
             Размеры: {} x {} см\n\
             Материал: {}\n\
             ──────────────────\n\
             {}\n\
             ──────────────────\n\
             Контакт: {}\n",
            order.id,
            order.width_cm,
            order.height_cm,
            order.texture_name,
            breakdown_summary(
                &order.breakdown,
                self.pricing.payment_commission_rate,
                self.pricing.sales_tax_rate
            ),
            format_phone(&order.contact),
        );
        if let Some(date) = &order.delivery_date {
            text.push_str(&format!("Дата выполнения: {date}\n"));
        }
        text.push_str(&format!(
            "Статус: {}\nСоздан: {}",
            order.status.label(),
            order.created_at.format("%d.%m.%Y %H:%M")
        ));
        text
    }
}

fn status_keyboard(id: OrderId) -> Keyboard {
    Keyboard::Inline(vec![
        vec![
            InlineButton::new("✅ В обработку", format!("status:{id}:processing")),
            InlineButton::new("✔️ Завершить", format!("status:{id}:completed")),
        ],
        vec![InlineButton::new("❌ Отменить", format!("status:{id}:cancelled"))],
    ])
}

#[async_trait]
impl Notifier for GatewayNotifier {
    async fn notify_admin(&self, order: &Order) -> Result<(), AtelierError> {
        let chats = self.admin.admin_chats();
        if chats.is_empty() {
            debug!(order_id = %order.id, "no admin chats configured");
            return Ok(());
        }
        self.broadcast_admins(&self.admin_order_text(order), status_keyboard(order.id))
            .await?;

        let path = self.export_order(order).await?;
        let caption = format!("📊 Детали заказа #{}", order.id);
        for chat in chats {
            self.budget
                .run(self.gateway.send_document(ChatId(chat), &path, &caption))
                .await?;
        }
        Ok(())
    }

    async fn notify_channel(&self, order: &Order, display_name: &str) -> Result<(), AtelierError> {
        let Some(channel) = self.admin.channel_id else {
            return Ok(());
        };
        let text = format!(
            "📦 Новый заказ #{}\n\
             Материал: {}\n\
             Размер: {}x{} см\n\
             Цена: {}\n\
             Контакт: {}\n\
             Клиент: {display_name}",
            order.id,
            order.texture_name,
            order.width_cm,
            order.height_cm,
            money(order.breakdown.final_price),
            format_phone(&order.contact),
        );
        self.send(ChatId(channel), &text, Keyboard::None).await
    }

    async fn notify_status_change(
        &self,
        order: &Order,
        previous: OrderStatus,
    ) -> Result<(), AtelierError> {
        let admin_text = format!(
            "✅ Статус заказа #{} изменён: {} → {}",
            order.id,
            previous.label(),
            order.status.label()
        );
        let admins = self.broadcast_admins(&admin_text, Keyboard::None).await;

        let customer_text = format!(
            "ℹ️ Статус вашего заказа #{} изменён на: {}",
            order.id,
            order.status.label()
        );
        let customer = self
            .send(ChatId::from(order.user_id), &customer_text, Keyboard::None)
            .await;
        admins.and(customer)
    }

    async fn notify_privacy_agreement(&self, display_name: &str) -> Result<(), AtelierError> {
        let Some(channel) = self.admin.channel_id else {
            return Ok(());
        };
        let text = format!(
            "🔐 Пользователь {display_name} подтвердил согласие на обработку персональных данных."
        );
        self.send(ChatId(channel), &text, Keyboard::None).await
    }

    async fn export_order(&self, order: &Order) -> Result<PathBuf, AtelierError> {
        self.exporter.export_order(order).await
    }

    async fn export_all_orders(&self) -> Result<PathBuf, AtelierError> {
        let orders = self.budget.run(self.repo.list_orders()).await?;
        self.exporter.export_all(orders).await
    }
}

