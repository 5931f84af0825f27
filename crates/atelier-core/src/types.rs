// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the intake flow, storage, and gateway adapters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Identifier of a chat user (the customer or an administrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of any chat a message can be delivered to (private chat or channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl From<UserId> for ChatId {
    fn from(user: UserId) -> Self {
        // Private chats share their id with the user.
        ChatId(user.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a delivered message, scoped to its chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i32);

/// Identifier assigned to an order by the repository on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a collaborator trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Gateway,
    Repository,
    SessionStore,
}

// --- Conversation ---

/// Position in the fixed order-intake conversation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Step {
    PrivacyAgreement,
    ServiceSelection,
    ServiceType,
    CustomTextureInput,
    Dimensions,
    DateSelection,
    ManualDateInput,
    DateConfirmation,
    ContactMethod,
    PhoneNumber,
}

impl Step {
    /// Steps a handler running at `self` may move the conversation to.
    ///
    /// The first entry is the forward successor; the rest are the explicit
    /// branch, back and retry edges. Clearing the state (cancel or order
    /// completion) is always permitted and is not listed.
    pub fn allowed_next(self) -> &'static [Step] {
        match self {
            Step::PrivacyAgreement => &[Step::ServiceSelection],
            Step::ServiceSelection => &[Step::ServiceType],
            Step::ServiceType => &[Step::Dimensions, Step::CustomTextureInput],
            Step::CustomTextureInput => &[Step::Dimensions, Step::ServiceType],
            Step::Dimensions => &[Step::DateSelection, Step::ServiceType],
            Step::DateSelection => &[
                Step::DateConfirmation,
                Step::ManualDateInput,
                Step::Dimensions,
            ],
            Step::ManualDateInput => &[Step::DateConfirmation, Step::Dimensions],
            Step::DateConfirmation => &[
                Step::ContactMethod,
                Step::DateSelection,
                Step::Dimensions,
            ],
            Step::ContactMethod => &[Step::PhoneNumber, Step::DateSelection],
            Step::PhoneNumber => &[],
        }
    }

    /// Returns true if moving from `self` to `next` follows a defined edge.
    pub fn may_advance_to(self, next: Step) -> bool {
        self == next || self.allowed_next().contains(&next)
    }
}

/// How the customer picked the material for the order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// A material from the catalog keyboard.
    Catalog,
    /// Free-text description of a material outside the catalog.
    Custom,
}

/// Per-user progress through the intake flow.
///
/// A missing or expired session is represented by `ConversationState::default()`,
/// whose `step` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationState {
    pub step: Option<Step>,
    /// Material name as chosen from the catalog or typed by the user.
    pub service: Option<String>,
    pub service_type: Option<ServiceKind>,
    pub width_cm: Option<u32>,
    pub height_cm: Option<u32>,
    pub texture_id: Option<String>,
    /// Delivery date, `DD.MM.YYYY`.
    pub date: Option<String>,
    pub phone_number: Option<String>,
    /// Last quoted final price, formatted for display.
    pub price: Option<String>,
    /// Key of the order this conversation creates. Set once, right before
    /// the first insert attempt, so a retried submission maps to the same row.
    pub order_key: Option<String>,
}

impl ConversationState {
    /// Fresh state positioned at `step`.
    pub fn at(step: Step) -> Self {
        Self {
            step: Some(step),
            ..Self::default()
        }
    }

    /// True when no session exists for the user.
    pub fn is_empty(&self) -> bool {
        self.step.is_none()
    }
}

// --- Catalog and orders ---

/// A selectable material with a per-area unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub name: String,
    /// Price per square decimetre.
    pub price_per_dm2: f64,
    pub image_url: Option<String>,
    pub in_stock: bool,
}

/// Lifecycle status of an order. The only field mutated after creation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Customer-facing label.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::New => "Новый",
            OrderStatus::Processing => "В обработке",
            OrderStatus::Completed => "Завершён",
            OrderStatus::Cancelled => "Отменён",
        }
    }
}

/// Every figure derived by the pricing engine for one order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub area_dm2: f64,
    pub material_cost: f64,
    pub processing_cost: f64,
    pub total_cost: f64,
    /// Customer-facing price.
    pub final_price: f64,
    pub commission: f64,
    pub tax: f64,
    pub net_revenue: f64,
    pub profit: f64,
}

/// An order about to be inserted. The repository assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// Unique per conversation; a second insert with the same key is a no-op.
    pub order_key: String,
    pub user_id: UserId,
    pub width_cm: u32,
    pub height_cm: u32,
    pub texture_id: String,
    pub texture_name: String,
    /// Material price snapshotted at creation time.
    pub price_per_dm2: f64,
    pub breakdown: PriceBreakdown,
    pub contact: String,
    pub delivery_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub width_cm: u32,
    pub height_cm: u32,
    pub texture_id: String,
    pub texture_name: String,
    pub price_per_dm2: f64,
    pub breakdown: PriceBreakdown,
    pub contact: String,
    pub delivery_date: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds the persisted view of `new` once the repository has assigned `id`.
    pub fn from_new(id: OrderId, new: NewOrder) -> Self {
        Self {
            id,
            user_id: new.user_id,
            width_cm: new.width_cm,
            height_cm: new.height_cm,
            texture_id: new.texture_id,
            texture_name: new.texture_name,
            price_per_dm2: new.price_per_dm2,
            breakdown: new.breakdown,
            contact: new.contact,
            delivery_date: new.delivery_date,
            status: OrderStatus::New,
            created_at: new.created_at,
        }
    }
}

/// Outcome of [`OrderRepository::save_order`](crate::OrderRepository::save_order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedOrder {
    pub id: OrderId,
    /// False when an order with the same key already existed.
    pub inserted: bool,
}

/// Privacy agreement acceptance and last confirmed contact for a user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAgreement {
    pub user_id: UserId,
    pub agreed_at: DateTime<Utc>,
    pub phone: Option<String>,
}

/// Order counts and revenue for one reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodStats {
    pub orders: u64,
    pub revenue: f64,
}

/// Aggregate order statistics for the admin report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    pub total: PeriodStats,
    pub today: PeriodStats,
    /// Last 7 days.
    pub week: PeriodStats,
    /// Last 30 days.
    pub month: PeriodStats,
    pub by_status: Vec<(OrderStatus, u64)>,
}

// --- Gateway ---

/// A reply keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyButton {
    pub text: String,
    /// Asks the client to share the user's phone number.
    pub request_contact: bool,
}

impl ReplyButton {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            request_contact: false,
        }
    }

    pub fn contact(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            request_contact: true,
        }
    }
}

/// An inline keyboard button carrying callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: data.into(),
        }
    }
}

/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Keyboard {
    /// Leave whatever keyboard the client shows.
    #[default]
    None,
    Reply(Vec<Vec<ReplyButton>>),
    Inline(Vec<Vec<InlineButton>>),
    /// Hide the reply keyboard.
    Remove,
}

/// Payload of an inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Text(String),
    /// A `/command`, lowercased, without the slash or bot mention.
    Command { name: String, args: Vec<String> },
    Callback {
        data: String,
        message_id: Option<MessageId>,
    },
    /// A shared contact card.
    Contact { phone: String },
}

/// An inbound update delivered by the messaging gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub username: Option<String>,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn text(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            username: None,
            kind: EventKind::Text(text.into()),
        }
    }

    /// Display name used in channel notices: `@username` or `id<user>`.
    pub fn display_name(&self) -> String {
        display_name(self.user_id, self.username.as_deref())
    }
}

/// Formats a user for staff-facing notices.
pub fn display_name(user_id: UserId, username: Option<&str>) -> String {
    match username {
        Some(name) if !name.is_empty() => format!("@{name}"),
        _ => format!("id{user_id}"),
    }
}
