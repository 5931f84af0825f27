// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presentation of prices. The only place figures are rounded.

use atelier_core::types::PriceBreakdown;

/// Two decimals and a rouble sign, e.g. `2250.00 ₽`.
pub fn money(value: f64) -> String {
    format!("{value:.2} ₽")
}

/// A rate as a whole-ish percentage, e.g. `3%` or `2.5%`.
pub fn percent(rate: f64) -> String {
    let pct = rate * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{}%", pct.round() as i64)
    } else {
        format!("{pct:.1}%")
    }
}

/// Staff-facing multi-line breakdown.
pub fn breakdown_summary(b: &PriceBreakdown, commission_rate: f64, tax_rate: f64) -> String {
    format!(
        "💵 Итоговая цена: {}\n\
         Площадь: {:.2} дм²\n\
         - Стоимость материала: {}\n\
         - Обработка: {}\n\
         - Себестоимость: {}\n\
         - Комиссия платежа ({}): {}\n\
         - Налог ({}): {}\n\
         Чистая выручка: {}\n\
         Прибыль: {}",
        money(b.final_price),
        b.area_dm2,
        money(b.material_cost),
        money(b.processing_cost),
        money(b.total_cost),
        percent(commission_rate),
        money(b.commission),
        percent(tax_rate),
        money(b.tax),
        money(b.net_revenue),
        money(b.profit),
    )
}
