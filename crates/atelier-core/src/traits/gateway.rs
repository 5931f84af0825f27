// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging gateway trait for the chat transport.

use std::path::Path;

use async_trait::async_trait;

use crate::error::AtelierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatId, InboundEvent, Keyboard, MessageId};

/// Chat transport: delivers prompts and receives user updates.
#[async_trait]
pub trait MessagingGateway: PluginAdapter {
    /// Starts receiving updates. Calling it twice is a no-op.
    async fn connect(&self) -> Result<(), AtelierError>;

    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<MessageId, AtelierError>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), AtelierError>;

    /// Uploads a file with a caption.
    async fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        caption: &str,
    ) -> Result<MessageId, AtelierError>;

    /// Waits for the next inbound update.
    async fn receive(&self) -> Result<InboundEvent, AtelierError>;
}
