// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order intake for Atelier.
//!
//! The [`IntakeService`] is the conversation state machine: it resolves each
//! user's current [`Step`](atelier_core::Step) from the session store, runs
//! the step's handler and, at the terminal step, creates the order. The
//! [`Dispatcher`] feeds it events from the messaging gateway with per-user
//! serialization, and the [`NotificationWorker`] delivers staff notices in
//! the background.

pub mod admin;
pub mod dispatcher;
mod machine;
pub mod notifier;
pub mod notify;
pub mod order;
pub mod prompts;
pub mod service;
pub mod shutdown;
pub mod validators;

pub use admin::AdminError;
pub use dispatcher::Dispatcher;
pub use notifier::GatewayNotifier;
pub use notify::{NotificationJob, NotificationQueue, NotificationWorker};
pub use order::OrderError;
pub use service::{Collaborators, IntakeService};
pub use shutdown::install_signal_handler;
