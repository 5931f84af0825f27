// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram messaging gateway for Atelier.
//!
//! Implements [`MessagingGateway`] for the Telegram Bot API via teloxide:
//! long polling feeds private messages and callback queries into a bounded
//! channel drained by [`MessagingGateway::receive`].

pub mod handler;
pub mod keyboard;

use std::path::Path;

use async_trait::async_trait;
use atelier_config::model::TelegramConfig;
use atelier_core::error::AtelierError;
use atelier_core::traits::{MessagingGateway, PluginAdapter};
use atelier_core::types::{AdapterType, ChatId, HealthStatus, InboundEvent, Keyboard, MessageId};
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{ChatId as TgChatId, InputFile, MessageId as TgMessageId};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const INBOUND_CAPACITY: usize = 100;

/// Telegram gateway implementing [`MessagingGateway`].
pub struct TelegramGateway {
    bot: Bot,
    inbound_rx: Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TelegramGateway {
    /// Creates a new Telegram gateway.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, AtelierError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            AtelierError::Config("telegram.bot_token is required for the Telegram gateway".into())
        })?;

        if token.is_empty() {
            return Err(AtelierError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        Ok(Self {
            bot: Bot::new(token),
            inbound_rx: Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: Mutex::new(None),
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

fn request_error(context: &str, e: RequestError) -> AtelierError {
    AtelierError::Gateway {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn forward(tx: &mpsc::Sender<InboundEvent>, event: Option<InboundEvent>, kind: &'static str) {
    let Some(event) = event else {
        debug!(kind, "ignoring unsupported update");
        return;
    };
    metrics::counter!("atelier_telegram_updates_total", "kind" => kind).increment(1);
    if tx.send(event).await.is_err() {
        warn!("inbound channel closed, dropping update");
    }
}

#[async_trait]
impl PluginAdapter for TelegramGateway {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, AtelierError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), AtelierError> {
        debug!("Telegram gateway shutting down");
        if let Some(handle) = self.polling_handle.lock().await.take() {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn connect(&self) -> Result<(), AtelierError> {
        let mut polling = self.polling_handle.lock().await;
        if polling.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let message_tx = self.inbound_tx.clone();
        let callback_tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(move |msg: Message| {
                    let tx = message_tx.clone();
                    async move {
                        if !handler::is_dm(&msg) {
                            debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                            return respond(());
                        }
                        forward(&tx, handler::to_inbound_event(&msg), "message").await;
                        respond(())
                    }
                }))
                .branch(Update::filter_callback_query().endpoint(
                    move |bot: Bot, query: CallbackQuery| {
                        let tx = callback_tx.clone();
                        async move {
                            // Stops the client's loading indicator; failure is cosmetic.
                            if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
                                warn!(error = %e, "failed to answer callback query");
                            }
                            forward(&tx, handler::callback_to_event(&query), "callback").await;
                            respond(())
                        }
                    },
                ));

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        *polling = Some(handle);
        Ok(())
    }

    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<MessageId, AtelierError> {
        let mut request = self.bot.send_message(TgChatId(chat.0), text);
        if let Some(markup) = keyboard::to_reply_markup(&keyboard) {
            request = request.reply_markup(markup);
        }
        let sent = request
            .await
            .map_err(|e| request_error("failed to send message", e))?;
        Ok(MessageId(sent.id.0))
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), AtelierError> {
        self.bot
            .delete_message(TgChatId(chat.0), TgMessageId(message.0))
            .await
            .map_err(|e| request_error("failed to delete message", e))?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        caption: &str,
    ) -> Result<MessageId, AtelierError> {
        let sent = self
            .bot
            .send_document(TgChatId(chat.0), InputFile::file(path.to_path_buf()))
            .caption(caption)
            .await
            .map_err(|e| request_error("failed to send document", e))?;
        Ok(MessageId(sent.id.0))
    }

    async fn receive(&self) -> Result<InboundEvent, AtelierError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| AtelierError::gateway("Telegram inbound stream closed"))
    }
}
