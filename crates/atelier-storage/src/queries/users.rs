// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Privacy agreement records.

use atelier_core::AtelierError;
use atelier_core::types::{UserAgreement, UserId};
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::{Database, format_timestamp, map_tr_err, parse_timestamp};

/// Record acceptance; an existing record keeps its original time.
pub async fn save_agreement(
    db: &Database,
    user: UserId,
    at: DateTime<Utc>,
) -> Result<(), AtelierError> {
    let at = format_timestamp(at);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO user_agreements (user_id, agreed_at) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO NOTHING",
                params![user.0, at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_agreement(
    db: &Database,
    user: UserId,
) -> Result<Option<UserAgreement>, AtelierError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT user_id, agreed_at, phone FROM user_agreements WHERE user_id = ?1",
                params![user.0],
                |row| {
                    let agreed_at: String = row.get(1)?;
                    Ok(UserAgreement {
                        user_id: UserId(row.get(0)?),
                        agreed_at: parse_timestamp(1, &agreed_at)?,
                        phone: row.get(2)?,
                    })
                },
            );
            match result {
                Ok(a) => Ok(Some(a)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Store the last confirmed phone, creating the agreement record if missing.
pub async fn update_phone(
    db: &Database,
    user: UserId,
    phone: &str,
    now: DateTime<Utc>,
) -> Result<(), AtelierError> {
    let phone = phone.to_string();
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO user_agreements (user_id, agreed_at, phone) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET phone = excluded.phone",
                params![user.0, now, phone],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
