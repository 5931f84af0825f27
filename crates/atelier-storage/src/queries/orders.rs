// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order inserts, lookups, status updates, and statistics.

use std::str::FromStr;

use atelier_core::AtelierError;
use atelier_core::types::{
    NewOrder, Order, OrderId, OrderStatus, PeriodStats, PriceBreakdown, SavedOrder, Statistics,
    UserId,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::{Row, params};
use strum::IntoEnumIterator;

use crate::database::{Database, format_timestamp, map_tr_err, parse_timestamp};

const ORDER_COLUMNS: &str = "id, user_id, width_cm, height_cm, texture_id, texture_name, \
     price_per_dm2, area_dm2, material_cost, processing_cost, total_cost, price, commission, \
     tax, net_revenue, profit, contact, delivery_date, status, created_at";

fn row_to_order(row: &Row<'_>) -> rusqlite::Result<Order> {
    let status: String = row.get(18)?;
    let status = OrderStatus::from_str(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(18, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: String = row.get(19)?;

    Ok(Order {
        id: OrderId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        width_cm: row.get(2)?,
        height_cm: row.get(3)?,
        texture_id: row.get(4)?,
        texture_name: row.get(5)?,
        price_per_dm2: row.get(6)?,
        breakdown: PriceBreakdown {
            area_dm2: row.get(7)?,
            material_cost: row.get(8)?,
            processing_cost: row.get(9)?,
            total_cost: row.get(10)?,
            final_price: row.get(11)?,
            commission: row.get(12)?,
            tax: row.get(13)?,
            net_revenue: row.get(14)?,
            profit: row.get(15)?,
        },
        contact: row.get(16)?,
        delivery_date: row.get(17)?,
        status,
        created_at: parse_timestamp(19, &created_at)?,
    })
}

/// Insert an order with status `new`. An existing row with the same
/// `order_key` wins and its id is returned instead.
pub async fn insert_order(db: &Database, order: &NewOrder) -> Result<SavedOrder, AtelierError> {
    let order = order.clone();
    db.connection()
        .call(move |conn| {
            let b = order.breakdown;
            let inserted = conn.execute(
                "INSERT INTO orders (order_key, user_id, width_cm, height_cm, texture_id, texture_name, \
                 price_per_dm2, area_dm2, material_cost, processing_cost, total_cost, price, \
                 commission, tax, net_revenue, profit, contact, delivery_date, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, 'new', ?19)
                 ON CONFLICT(order_key) DO NOTHING",
                params![
                    order.order_key,
                    order.user_id.0,
                    order.width_cm,
                    order.height_cm,
                    order.texture_id,
                    order.texture_name,
                    order.price_per_dm2,
                    b.area_dm2,
                    b.material_cost,
                    b.processing_cost,
                    b.total_cost,
                    b.final_price,
                    b.commission,
                    b.tax,
                    b.net_revenue,
                    b.profit,
                    order.contact,
                    order.delivery_date,
                    format_timestamp(order.created_at),
                ],
            )? > 0;
            let id = if inserted {
                conn.last_insert_rowid()
            } else {
                conn.query_row(
                    "SELECT id FROM orders WHERE order_key = ?1",
                    params![order.order_key],
                    |row| row.get(0),
                )?
            };
            Ok(SavedOrder {
                id: OrderId(id),
                inserted,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Get an order by id.
pub async fn get_order(db: &Database, id: OrderId) -> Result<Option<Order>, AtelierError> {
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
            match conn.query_row(&sql, params![id.0], row_to_order) {
                Ok(order) => Ok(Some(order)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Set an order's status. Returns `false` when the id is unknown.
pub async fn update_status(
    db: &Database,
    id: OrderId,
    status: OrderStatus,
) -> Result<bool, AtelierError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE orders SET status = ?1 WHERE id = ?2",
                params![status, id.0],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// List orders newest first, optionally only those of one user.
pub async fn list_orders(
    db: &Database,
    user: Option<UserId>,
    limit: Option<usize>,
) -> Result<Vec<Order>, AtelierError> {
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    db.connection()
        .call(move |conn| {
            let orders = match user {
                Some(user) => {
                    let sql = format!(
                        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 \
                         ORDER BY id DESC LIMIT ?2"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map(params![user.0, limit], row_to_order)?
                        .collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id DESC LIMIT ?1");
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map(params![limit], row_to_order)?
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            Ok(orders)
        })
        .await
        .map_err(map_tr_err)
}

/// Midnight of `now`'s calendar day in its own time zone.
fn day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let utc = now.with_timezone(&Utc);
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest())
        .map_or(utc, |start| start.with_timezone(&Utc))
}

/// Aggregate counts and revenue relative to `now`.
///
/// "Today" starts at midnight in `now`'s time zone, the same calendar the
/// conversation uses for delivery dates. Week and month are rolling 7 and
/// 30 days.
pub async fn statistics<Tz>(db: &Database, now: DateTime<Tz>) -> Result<Statistics, AtelierError>
where
    Tz: TimeZone + Send,
    Tz::Offset: Send,
{
    let today = format_timestamp(day_start(&now));
    let now = now.with_timezone(&Utc);
    let week = format_timestamp(now - Duration::days(7));
    let month = format_timestamp(now - Duration::days(30));

    let (periods, counts) = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT COUNT(*), COALESCE(SUM(price), 0.0) FROM orders WHERE created_at >= ?1",
            )?;
            // Empty cutoff matches every row.
            let mut periods = [PeriodStats::default(); 4];
            for (slot, cutoff) in periods.iter_mut().zip([String::new(), today, week, month]) {
                *slot = stmt.query_row(params![cutoff], |row| {
                    Ok(PeriodStats {
                        orders: row.get::<_, i64>(0)?.max(0) as u64,
                        revenue: row.get(1)?,
                    })
                })?;
            }

            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM orders GROUP BY status")?;
            let counts = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok((periods, counts))
        })
        .await
        .map_err(map_tr_err)?;

    let by_status = OrderStatus::iter()
        .map(|status| {
            let n = counts
                .iter()
                .find(|(s, _)| *s == status.to_string())
                .map_or(0, |(_, n)| (*n).max(0) as u64);
            (status, n)
        })
        .collect();

    let [total, today, week, month] = periods;
    Ok(Statistics {
        total,
        today,
        week,
        month,
        by_status,
    })
}
