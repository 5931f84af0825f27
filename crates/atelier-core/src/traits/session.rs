// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session store trait for per-user conversation state.

use async_trait::async_trait;

use crate::error::AtelierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationState, UserId};

/// Transient per-user key-value store holding [`ConversationState`].
///
/// Implementations apply a fixed time-to-live at `set` time.
#[async_trait]
pub trait SessionStore: PluginAdapter {
    /// Returns the user's state, or `ConversationState::default()` when the key
    /// is missing or expired. Errors only when the backend cannot be reached.
    async fn get(&self, user: UserId) -> Result<ConversationState, AtelierError>;

    /// Stores the user's state, restarting its TTL.
    async fn set(&self, user: UserId, state: &ConversationState) -> Result<(), AtelierError>;

    /// Deletes the user's state. Clearing a missing key is not an error.
    async fn clear(&self, user: UserId) -> Result<(), AtelierError>;
}
