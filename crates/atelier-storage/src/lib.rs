// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for Atelier.
//!
//! Provides the SQLite order repository with embedded migrations, the two
//! conversation session stores, and the CSV exporter used for admin reports.

pub mod adapter;
pub mod database;
pub mod export;
pub mod memory;
pub mod migrations;
pub mod queries;
pub mod session;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use export::SpreadsheetExporter;
pub use memory::MemorySessionStore;
pub use session::SqliteSessionStore;
