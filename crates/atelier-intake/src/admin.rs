// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrator operations: status updates, statistics and exports.

use std::str::FromStr;

use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use atelier_core::AtelierError;
use atelier_core::types::{Keyboard, Order, OrderId, OrderStatus, Statistics, UserId};
use atelier_pricing::money;

use crate::notify::NotificationJob;
use crate::service::IntakeService;

const ACCESS_DENIED: &str = "⛔ Доступ запрещён";
const STATUS_USAGE: &str = "Использование: /status <ID_заказа> <новый_статус>";
const BAD_ORDER_ID: &str = "Неверный формат ID заказа";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("invalid status {0:?}")]
    InvalidStatus(String),

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error(transparent)]
    Storage(#[from] AtelierError),
}

impl AdminError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidStatus(_) => {
                "Недопустимый статус. Допустимые значения: new, processing, completed, cancelled"
            }
            Self::NotFound(_) => "Заказ не найден",
            Self::Storage(_) => "Ошибка при обновлении статуса",
        }
    }
}

impl IntakeService {
    /// Sets the status of an order and queues the admin and customer notices.
    ///
    /// Only the four known statuses are accepted; anything else fails with
    /// [`AdminError::InvalidStatus`] before the repository is touched.
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<Order, AdminError> {
        let status = OrderStatus::from_str(&status.trim().to_lowercase())
            .map_err(|_| AdminError::InvalidStatus(status.to_string()))?;

        let Some(mut order) = self.budget.run(self.repo.get_order_by_id(id)).await? else {
            return Err(AdminError::NotFound(id));
        };
        if !self.budget.run(self.repo.update_status(id, status)).await? {
            return Err(AdminError::NotFound(id));
        }

        let previous = order.status;
        order.status = status;
        counter!("atelier_status_updates_total").increment(1);
        info!(order_id = %id, %previous, %status, "order status updated");

        self.notifications.enqueue(NotificationJob::StatusChanged {
            order: order.clone(),
            previous,
        });
        Ok(order)
    }

    pub(crate) async fn admin_command(
        &self,
        user: UserId,
        name: &str,
        args: &[String],
    ) -> Result<(), AtelierError> {
        if !self.admin.is_admin(user.0) {
            warn!(user_id = %user, command = name, "admin command from non-admin");
            self.send(user, ACCESS_DENIED, Keyboard::None).await?;
            return Ok(());
        }
        match (name, args) {
            ("stats", _) => {
                let stats = self.budget.run(self.repo.get_statistics()).await?;
                self.send(user, &format_statistics(&stats), Keyboard::None)
                    .await?;
            }
            ("export", []) => {
                let path = self.budget.run(self.notifier.export_all_orders()).await?;
                self.budget
                    .run(
                        self.gateway
                            .send_document(user.into(), &path, "📊 Все заказы"),
                    )
                    .await?;
            }
            ("export", [id]) => {
                let Ok(id) = id.parse::<i64>() else {
                    self.send(user, BAD_ORDER_ID, Keyboard::None).await?;
                    return Ok(());
                };
                let Some(order) = self.budget.run(self.repo.get_order_by_id(OrderId(id))).await?
                else {
                    self.send(user, "Заказ не найден", Keyboard::None).await?;
                    return Ok(());
                };
                let path = self.budget.run(self.notifier.export_order(&order)).await?;
                let caption = format!("📊 Заказ #{}", order.id);
                self.budget
                    .run(self.gateway.send_document(user.into(), &path, &caption))
                    .await?;
            }
            ("status", [id, status]) => self.apply_status(user, id, status).await?,
            ("export", _) => {
                self.send(user, "Использование: /export [ID_заказа]", Keyboard::None)
                    .await?;
            }
            _ => {
                self.send(user, STATUS_USAGE, Keyboard::None).await?;
            }
        }
        Ok(())
    }

    /// `status:<id>:<status>` callback from an admin notification.
    pub(crate) async fn status_callback(
        &self,
        user: UserId,
        payload: &str,
    ) -> Result<(), AtelierError> {
        if !self.admin.is_admin(user.0) {
            self.send(user, ACCESS_DENIED, Keyboard::None).await?;
            return Ok(());
        }
        let Some((id, status)) = payload.split_once(':') else {
            self.send(user, BAD_ORDER_ID, Keyboard::None).await?;
            return Ok(());
        };
        self.apply_status(user, id, status).await
    }

    async fn apply_status(&self, user: UserId, id: &str, status: &str) -> Result<(), AtelierError> {
        let Ok(id) = id.parse::<i64>() else {
            self.send(user, BAD_ORDER_ID, Keyboard::None).await?;
            return Ok(());
        };
        let text = match self.update_status(OrderId(id), status).await {
            Ok(order) => format!(
                "✅ Статус заказа #{} изменён на: {}",
                order.id,
                order.status.label()
            ),
            Err(AdminError::Storage(e)) => return Err(e),
            Err(e) => {
                warn!(order_id = id, error = %e, "status update rejected");
                e.user_message().to_string()
            }
        };
        self.send(user, &text, Keyboard::None).await?;
        Ok(())
    }
}

pub fn format_statistics(stats: &Statistics) -> String {
    let count = |status: OrderStatus| {
        stats
            .by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    };
    format!(
        "📊 Статистика заказов\n\n\
         📌 Всего заказов: {}\n\
         💰 Общая сумма: {}\n\
         📅 За сегодня: {} ({})\n\
         📅 За неделю: {} ({})\n\
         📅 За месяц: {} ({})\n\n\
         📌 По статусам:\n\
         🆕 Новые: {}\n\
         🔄 В обработке: {}\n\
         ✅ Завершённые: {}\n\
         ❌ Отменённые: {}",
        stats.total.orders,
        money(stats.total.revenue),
        stats.today.orders,
        money(stats.today.revenue),
        stats.week.orders,
        money(stats.week.revenue),
        stats.month.orders,
        money(stats.month.revenue),
        count(OrderStatus::New),
        count(OrderStatus::Processing),
        count(OrderStatus::Completed),
        count(OrderStatus::Cancelled),
    )
}
