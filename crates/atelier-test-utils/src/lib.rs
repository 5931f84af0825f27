// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Atelier integration tests.
//!
//! Provides a mock gateway, a fault-injecting repository wrapper and a test
//! harness wiring the real intake service against temp storage.
//!
//! # Components
//!
//! - [`MockGateway`] - Mock messaging gateway with event injection and capture
//! - [`FaultyRepository`] - Repository wrapper with switchable failures
//! - [`FaultySessionStore`] - Session store wrapper with switchable failures
//! - [`TestHarness`] - Fully wired intake service for scenario tests

pub mod faulty_repository;
pub mod faulty_sessions;
pub mod harness;
pub mod mock_gateway;

pub use faulty_repository::FaultyRepository;
pub use faulty_sessions::FaultySessionStore;
pub use harness::TestHarness;
pub use mock_gateway::{MockGateway, SentDocument, SentMessage, callback, command, contact};
