// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Atelier order-intake bot.
//!
//! This crate provides the domain types, the shared error type, and the
//! collaborator traits (session store, order repository, messaging gateway,
//! notifier) that the intake flow is written against. Concrete adapters live
//! in their own crates and are injected at startup.

pub mod deadline;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use deadline::CallBudget;
pub use error::AtelierError;
pub use types::{
    AdapterType, ChatId, ConversationState, HealthStatus, MessageId, OrderId, Step, UserId,
};

pub use traits::{MessagingGateway, Notifier, OrderRepository, PluginAdapter, SessionStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atelier_error_has_all_variants() {
        let _config = AtelierError::Config("test".into());
        let _storage = AtelierError::storage(std::io::Error::other("test"));
        let _gateway = AtelierError::gateway("test");
        let _health = AtelierError::HealthCheckFailed {
            name: "test".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _timeout = AtelierError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _cancelled = AtelierError::Cancelled;
        let _internal = AtelierError::Internal("test".into());
    }

    #[test]
    fn transient_errors_are_classified() {
        assert!(AtelierError::storage(std::io::Error::other("x")).is_transient());
        assert!(
            AtelierError::Timeout {
                duration: std::time::Duration::from_secs(1)
            }
            .is_transient()
        );
        assert!(!AtelierError::Config("x".into()).is_transient());
        assert!(!AtelierError::Cancelled.is_transient());
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Gateway,
            AdapterType::Repository,
            AdapterType::SessionStore,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_session_store<T: SessionStore>() {}
        fn _assert_repository<T: OrderRepository>() {}
        fn _assert_gateway<T: MessagingGateway>() {}
        fn _assert_notifier<T: Notifier>() {}
    }
}
