// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The intake service: routes inbound events to commands, callbacks and
//! step handlers.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use atelier_config::model::{AdminConfig, AtelierConfig, PricingConfig};
use atelier_core::types::{
    ConversationState, EventKind, InboundEvent, Keyboard, MessageId, Step, UserId,
};
use atelier_core::{
    AtelierError, CallBudget, MessagingGateway, Notifier, OrderRepository, SessionStore,
};

use crate::notify::NotificationQueue;
use crate::prompts;

/// Collaborators the service is wired against. Constructed once at startup.
#[derive(Clone)]
pub struct Collaborators {
    pub sessions: Arc<dyn SessionStore>,
    pub repository: Arc<dyn OrderRepository>,
    pub gateway: Arc<dyn MessagingGateway>,
    /// Used directly for on-demand exports.
    pub notifier: Arc<dyn Notifier>,
    /// Used for everything sent in the background.
    pub notifications: NotificationQueue,
}

/// Drives every user's conversation.
///
/// Callers must serialize calls to [`IntakeService::handle`] per user; step
/// transitions are read-modify-write on the session store.
pub struct IntakeService {
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) repo: Arc<dyn OrderRepository>,
    pub(crate) gateway: Arc<dyn MessagingGateway>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) notifications: NotificationQueue,
    pub(crate) pricing: PricingConfig,
    pub(crate) admin: AdminConfig,
    welcome_image_url: Option<String>,
    pub(crate) budget: CallBudget,
}

impl IntakeService {
    pub fn new(config: &AtelierConfig, deps: Collaborators, budget: CallBudget) -> Self {
        Self {
            sessions: deps.sessions,
            repo: deps.repository,
            gateway: deps.gateway,
            notifier: deps.notifier,
            notifications: deps.notifications,
            pricing: config.pricing.clone(),
            admin: config.admin.clone(),
            welcome_image_url: config.bot.welcome_image_url.clone(),
            budget,
        }
    }

    /// Handles one inbound event. Failures are logged and reported to the
    /// user as a generic retryable error; the conversation step is left as is.
    pub async fn handle(&self, event: InboundEvent) {
        let user = event.user_id;
        let result = match &event.kind {
            EventKind::Command { name, args } => self.on_command(&event, name, args).await,
            EventKind::Callback { data, message_id } => {
                self.on_callback(&event, data, *message_id).await
            }
            EventKind::Contact { phone } => self.on_contact(&event, phone).await,
            EventKind::Text(text) => self.on_text(&event, text.trim()).await,
        };

        match result {
            Ok(()) => {}
            Err(AtelierError::Cancelled) => {
                debug!(user_id = %user, "update abandoned on shutdown");
            }
            Err(e) => {
                error!(user_id = %user, error = %e, "failed to handle update");
                if let Err(e) = self.send(user, prompts::GENERIC_FAILURE, Keyboard::None).await {
                    warn!(user_id = %user, error = %e, "failed to report failure to user");
                }
            }
        }
    }

    async fn on_command(
        &self,
        event: &InboundEvent,
        name: &str,
        args: &[String],
    ) -> Result<(), AtelierError> {
        let user = event.user_id;
        debug!(user_id = %user, command = name, "command received");
        match name {
            "start" => self.start(user).await,
            "new_order" => self.new_order(user).await,
            "orders" => self.list_user_orders(user).await,
            "help" => self.send(user, prompts::HELP, Keyboard::None).await.map(drop),
            "cancel" => {
                let state = self.load(user).await?;
                self.cancel(user, state).await
            }
            "stats" | "export" | "status" => self.admin_command(user, name, args).await,
            _ => self.send(user, prompts::UNKNOWN, Keyboard::None).await.map(drop),
        }
    }

    async fn on_callback(
        &self,
        event: &InboundEvent,
        data: &str,
        message_id: Option<MessageId>,
    ) -> Result<(), AtelierError> {
        let user = event.user_id;
        match data.split_once(':') {
            Some(("texture", id)) => self.select_texture(user, id, message_id).await,
            Some(("status", rest)) => self.status_callback(user, rest).await,
            _ => {
                debug!(user_id = %user, data, "unrecognized callback");
                self.send(user, prompts::STALE_CHOICE, Keyboard::None)
                    .await
                    .map(drop)
            }
        }
    }

    /// `/start`: returning users with a saved phone go straight to the menu.
    async fn start(&self, user: UserId) -> Result<(), AtelierError> {
        let agreement = self.budget.run(self.repo.get_user_agreement(user)).await?;
        if let Some(phone) = agreement.and_then(|a| a.phone) {
            info!(user_id = %user, "returning user");
            self.send(
                user,
                &prompts::main_menu(Some(&phone)),
                prompts::place_order_keyboard(),
            )
            .await?;
            return self
                .save(user, &ConversationState::at(Step::ServiceSelection))
                .await;
        }

        let text = match &self.welcome_image_url {
            Some(url) => format!("{}\n\n{url}", prompts::PRIVACY),
            None => prompts::PRIVACY.to_string(),
        };
        self.send(user, &text, prompts::continue_keyboard()).await?;
        self.save(user, &ConversationState::at(Step::PrivacyAgreement))
            .await
    }

    /// `/new_order`: restarts at the service menu once the agreement is on file.
    async fn new_order(&self, user: UserId) -> Result<(), AtelierError> {
        if self
            .budget
            .run(self.repo.get_user_agreement(user))
            .await?
            .is_none()
        {
            return self.start(user).await;
        }
        self.send_service_menu(user, prompts::CHOOSE_SERVICE).await?;
        self.save(user, &ConversationState::at(Step::ServiceType))
            .await
    }

    async fn list_user_orders(&self, user: UserId) -> Result<(), AtelierError> {
        let orders = self
            .budget
            .run(self.repo.list_orders_for_user(user, 10))
            .await?;
        if orders.is_empty() {
            self.send(user, prompts::NO_ORDERS, Keyboard::None).await?;
            return Ok(());
        }
        let lines: Vec<String> = orders.iter().map(prompts::order_line).collect();
        let text = format!("📋 Ваши заказы:\n\n{}", lines.join("\n"));
        self.send(user, &text, Keyboard::None).await?;
        Ok(())
    }

    // --- Collaborator calls, each bounded by the call budget ---

    pub(crate) async fn send(
        &self,
        user: UserId,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<MessageId, AtelierError> {
        self.budget
            .run(self.gateway.send_message(user.into(), text, keyboard))
            .await
    }

    pub(crate) async fn load(&self, user: UserId) -> Result<ConversationState, AtelierError> {
        self.budget.run(self.sessions.get(user)).await
    }

    pub(crate) async fn save(
        &self,
        user: UserId,
        state: &ConversationState,
    ) -> Result<(), AtelierError> {
        self.budget.run(self.sessions.set(user, state)).await
    }

    pub(crate) async fn clear(&self, user: UserId) -> Result<(), AtelierError> {
        self.budget.run(self.sessions.clear(user)).await
    }

    /// Service menu keyboard built from the in-stock catalog.
    pub(crate) async fn service_menu(&self) -> Result<Keyboard, AtelierError> {
        let materials = self.budget.run(self.repo.list_textures()).await?;
        Ok(prompts::service_keyboard(&materials))
    }

    pub(crate) async fn send_service_menu(
        &self,
        user: UserId,
        text: &str,
    ) -> Result<(), AtelierError> {
        let menu = self.service_menu().await?;
        self.send(user, text, menu).await.map(drop)
    }
}
