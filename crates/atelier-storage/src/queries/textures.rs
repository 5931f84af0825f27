// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Material catalog lookups.

use atelier_core::AtelierError;
use atelier_core::types::Material;
use rusqlite::{Row, params};

use crate::database::{Database, map_tr_err};

fn row_to_material(row: &Row<'_>) -> rusqlite::Result<Material> {
    Ok(Material {
        id: row.get(0)?,
        name: row.get(1)?,
        price_per_dm2: row.get(2)?,
        image_url: row.get(3)?,
        in_stock: row.get(4)?,
    })
}

/// Get a material by id, in stock or not.
pub async fn get_texture(db: &Database, id: &str) -> Result<Option<Material>, AtelierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            match conn.query_row(
                "SELECT id, name, price_per_dm2, image_url, in_stock FROM textures WHERE id = ?1",
                params![id],
                row_to_material,
            ) {
                Ok(m) => Ok(Some(m)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Every material, optionally only those in stock, ordered by name.
pub async fn list_textures(
    db: &Database,
    in_stock_only: bool,
) -> Result<Vec<Material>, AtelierError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, price_per_dm2, image_url, in_stock FROM textures
                 WHERE in_stock = 1 OR ?1 = 0 ORDER BY name",
            )?;
            let rows = stmt
                .query_map(params![in_stock_only], row_to_material)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Find a material by name, ignoring case and surrounding whitespace.
///
/// SQLite's NOCASE only folds ASCII, so Cyrillic names are compared here.
pub async fn find_texture_by_name(
    db: &Database,
    name: &str,
) -> Result<Option<Material>, AtelierError> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return Ok(None);
    }
    let all = list_textures(db, false).await?;
    Ok(all
        .into_iter()
        .find(|m| m.name.to_lowercase() == wanted))
}
