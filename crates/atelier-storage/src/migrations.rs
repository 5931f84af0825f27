// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations (refinery).
//!
//! The `migrations/` directory is compiled into the binary and applied on
//! every [`Database::open`](crate::Database::open); refinery records what
//! has run in `refinery_schema_history`.

use atelier_core::AtelierError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply every pending migration.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), AtelierError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(AtelierError::storage)?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(())
}
