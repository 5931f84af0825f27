// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the intake flow.
//!
//! Adapters extend [`PluginAdapter`] and use `#[async_trait]` so they can be
//! held as `Arc<dyn Trait>` and injected at startup.

pub mod adapter;
pub mod gateway;
pub mod notifier;
pub mod repository;
pub mod session;

pub use adapter::PluginAdapter;
pub use gateway::MessagingGateway;
pub use notifier::Notifier;
pub use repository::OrderRepository;
pub use session::SessionStore;
