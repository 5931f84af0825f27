// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw conversation state rows. Serialization lives in the session store.

use atelier_core::AtelierError;
use atelier_core::types::UserId;
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::{Database, format_timestamp, map_tr_err};

/// The stored JSON for `user` if it has not expired at `now`.
pub async fn load_state(
    db: &Database,
    user: UserId,
    now: DateTime<Utc>,
) -> Result<Option<String>, AtelierError> {
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            match conn.query_row(
                "SELECT state FROM conversation_states WHERE user_id = ?1 AND expires_at > ?2",
                params![user.0, now],
                |row| row.get(0),
            ) {
                Ok(state) => Ok(Some(state)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

pub async fn store_state(
    db: &Database,
    user: UserId,
    json: String,
    expires_at: DateTime<Utc>,
) -> Result<(), AtelierError> {
    let expires_at = format_timestamp(expires_at);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_states (user_id, state, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET state = excluded.state,
                 expires_at = excluded.expires_at",
                params![user.0, json, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_state(db: &Database, user: UserId) -> Result<(), AtelierError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM conversation_states WHERE user_id = ?1",
                params![user.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every row that expired before `now`; returns how many were removed.
pub async fn purge_expired(db: &Database, now: DateTime<Utc>) -> Result<usize, AtelierError> {
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "DELETE FROM conversation_states WHERE expires_at <= ?1",
                params![now],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}
