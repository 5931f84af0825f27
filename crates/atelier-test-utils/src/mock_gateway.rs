// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging gateway for deterministic testing.
//!
//! `MockGateway` implements `MessagingGateway` with injectable inbound events
//! and captured outbound messages, deletions and documents.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use atelier_core::types::{
    AdapterType, ChatId, EventKind, HealthStatus, InboundEvent, Keyboard, MessageId, UserId,
};
use atelier_core::{AtelierError, MessagingGateway, PluginAdapter};

/// A message passed to `send_message`.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub id: MessageId,
    pub chat: ChatId,
    pub text: String,
    pub keyboard: Keyboard,
}

/// A file passed to `send_document`.
#[derive(Debug, Clone, PartialEq)]
pub struct SentDocument {
    pub chat: ChatId,
    pub path: PathBuf,
    pub caption: String,
}

/// A mock messaging gateway for testing.
///
/// Events injected via `inject_event()` are returned by `receive()`. Once
/// `close()` is called and the queue is drained, `receive()` fails with a
/// "closed" gateway error.
pub struct MockGateway {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    deleted: Arc<Mutex<Vec<(ChatId, MessageId)>>>,
    documents: Arc<Mutex<Vec<SentDocument>>>,
    notify: Arc<Notify>,
    next_id: AtomicI32,
    closed: AtomicBool,
    fail_sends: AtomicBool,
}

impl MockGateway {
    /// Create a new mock gateway with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            documents: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            next_id: AtomicI32::new(1),
            closed: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Inject an inbound event into the receive queue.
    pub async fn inject_event(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Inject a plain text message from `user`.
    pub async fn inject_text(&self, user: i64, text: &str) {
        self.inject_event(InboundEvent::text(UserId(user), text))
            .await;
    }

    /// Ends the inbound stream once the queue drains.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Makes every subsequent `send_message` fail.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Get all messages sent through `send_message()`.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages sent to one chat, oldest first.
    pub async fn sent_to(&self, chat: i64) -> Vec<SentMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat == ChatId(chat))
            .cloned()
            .collect()
    }

    /// Text of the newest message sent to `chat`.
    pub async fn last_text_to(&self, chat: i64) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| m.chat == ChatId(chat))
            .map(|m| m.text.clone())
    }

    pub async fn deleted_messages(&self) -> Vec<(ChatId, MessageId)> {
        self.deleted.lock().await.clone()
    }

    pub async fn documents(&self) -> Vec<SentDocument> {
        self.documents.lock().await.clone()
    }

    /// Clear all captured output.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
        self.deleted.lock().await.clear();
        self.documents.lock().await.clear();
    }

    /// Polls until at least `count` messages were sent to `chat`, or `timeout` elapses.
    pub async fn wait_for_messages_to(&self, chat: i64, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.sent_to(chat).await.len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Polls until at least `count` documents were sent, or `timeout` elapses.
    pub async fn wait_for_documents(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.documents.lock().await.len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, AtelierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AtelierError> {
        self.close();
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for MockGateway {
    async fn connect(&self) -> Result<(), AtelierError> {
        Ok(())
    }

    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<MessageId, AtelierError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(AtelierError::gateway("mock send failure"));
        }
        let id = self.next_message_id();
        self.sent.lock().await.push(SentMessage {
            id,
            chat,
            text: text.to_string(),
            keyboard,
        });
        Ok(id)
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), AtelierError> {
        self.deleted.lock().await.push((chat, message));
        Ok(())
    }

    async fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        caption: &str,
    ) -> Result<MessageId, AtelierError> {
        self.documents.lock().await.push(SentDocument {
            chat,
            path: path.to_path_buf(),
            caption: caption.to_string(),
        });
        Ok(self.next_message_id())
    }

    async fn receive(&self) -> Result<InboundEvent, AtelierError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
                if self.closed.load(Ordering::SeqCst) {
                    return Err(AtelierError::gateway("inbound stream closed"));
                }
            }
            self.notify.notified().await;
        }
    }
}

/// Builds a command event the way the gateway would deliver it.
pub fn command(user: i64, name: &str, args: &[&str]) -> InboundEvent {
    InboundEvent {
        user_id: UserId(user),
        username: None,
        kind: EventKind::Command {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        },
    }
}

/// Builds a callback event.
pub fn callback(user: i64, data: &str, message_id: Option<MessageId>) -> InboundEvent {
    InboundEvent {
        user_id: UserId(user),
        username: None,
        kind: EventKind::Callback {
            data: data.to_string(),
            message_id,
        },
    }
}

/// Builds a shared-contact event.
pub fn contact(user: i64, phone: &str) -> InboundEvent {
    InboundEvent {
        user_id: UserId(user),
        username: None,
        kind: EventKind::Contact {
            phone: phone.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive_returns_injected_events() {
        let gateway = MockGateway::new();
        gateway.inject_text(7, "hello").await;

        let event = gateway.receive().await.unwrap();
        assert_eq!(event.user_id, UserId(7));
        assert_eq!(event.kind, EventKind::Text("hello".into()));
    }

    #[tokio::test]
    async fn send_captures_messages_with_increasing_ids() {
        let gateway = MockGateway::new();
        let a = gateway
            .send_message(ChatId(1), "one", Keyboard::None)
            .await
            .unwrap();
        let b = gateway
            .send_message(ChatId(2), "two", Keyboard::Remove)
            .await
            .unwrap();
        assert!(b.0 > a.0);
        assert_eq!(gateway.sent_to(2).await[0].keyboard, Keyboard::Remove);
        assert_eq!(gateway.last_text_to(1).await.as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn closed_gateway_drains_then_errors() {
        let gateway = MockGateway::new();
        gateway.inject_text(1, "last").await;
        gateway.close();

        assert!(gateway.receive().await.is_ok());
        let err = gateway.receive().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[tokio::test]
    async fn failing_sends_are_not_captured() {
        let gateway = MockGateway::new();
        gateway.set_fail_sends(true);
        assert!(
            gateway
                .send_message(ChatId(1), "x", Keyboard::None)
                .await
                .is_err()
        );
        assert!(gateway.sent_messages().await.is_empty());
    }
}
