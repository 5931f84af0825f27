// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer-facing texts and keyboards.

use atelier_core::types::{InlineButton, Keyboard, Material, Order, ReplyButton};
use atelier_pricing::money;

use crate::validators::format_phone;

/// Reply keyboard button labels. Matched verbatim against inbound text.
pub mod buttons {
    pub const CONTINUE: &str = "✅ Продолжить";
    pub const PLACE_ORDER: &str = "✅ Оформить заказ";
    pub const OTHER_TEXTURE: &str = "Другая текстура";
    pub const CANCEL: &str = "❌ Отмена";
    pub const BACK: &str = "Назад";
    pub const TODAY: &str = "Сегодня";
    pub const TOMORROW: &str = "Завтра";
    pub const MANUAL_DATE: &str = "Выбрать дату вручную";
    pub const CONFIRM_DATE: &str = "✅ Подтвердить дату";
    pub const CHANGE_DATE: &str = "🔁 Сменить дату";
    pub const SEND_CONTACT: &str = "📱 Отправить контакт";
    pub const SHARE_CONTACT: &str = "📱 Поделиться контактом";
    pub const ENTER_MANUALLY: &str = "Ввести вручную";
}

pub const PRIVACY: &str = "Привет! 👋\n\n\
⚠️ Прежде чем продолжить, вы должны согласиться с нашей Политикой конфиденциальности.\n\n\
Мы собираем и храним:\n\
- Контактные данные (номер телефона)\n\
- Параметры заказа (размеры, материал)\n\
- Даты выполнения заказа\n\n\
Используя бота, вы подтверждаете согласие на обработку данных.";
pub const PRESS_CONTINUE: &str =
    "Пожалуйста, нажмите кнопку \"✅ Продолжить\" чтобы согласиться с условиями";
pub const AGREEMENT_THANKS: &str = "Спасибо за согласие! Теперь вы можете оформить заказ.";
pub const PRESS_PLACE_ORDER: &str =
    "Пожалуйста, нажмите кнопку \"✅ Оформить заказ\" чтобы продолжить";
pub const CHOOSE_SERVICE: &str = "Выберите тип услуги:";
pub const CHOOSE_OPTION: &str = "Пожалуйста, выберите один из предложенных вариантов";
pub const ENTER_TEXTURE: &str = "Введите желаемую текстуру:";
pub const TEXTURE_TOO_SHORT: &str = "Пожалуйста, введите название текстуры (минимум 3 символа)";
pub const ENTER_DIMENSIONS: &str = "Введите ширину и длину в сантиметрах через пробел \
(например: 30 40)\nМаксимальный размер: 80x50 см";
pub const PICK_MATERIAL: &str = "Выберите материал из каталога, чтобы рассчитать стоимость:";
pub const ASK_DATE: &str = "Когда вам удобно выполнить заказ?";
pub const ENTER_DATE: &str = "Введите дату вручную в формате ДД.ММ.ГГГГ";
pub const USE_BUTTONS: &str = "Пожалуйста, используйте кнопки для продолжения";
pub const ASK_CONTACT_METHOD: &str = "Как вам удобно предоставить контактные данные?";
pub const PRESS_SHARE_CONTACT: &str = "Пожалуйста, нажмите кнопку 'Поделиться контактом'";
pub const ENTER_PHONE: &str = "Введите ваш номер телефона в формате +79123456789 или 89123456789:";
pub const INVALID_PHONE: &str = "Пожалуйста, введите реальный номер телефона с кодом страны \
(например, +79161234567 или 89123456789)";
pub const CANCELLED_DATE: &str = "❌ Выбор даты отменен. Введите размеры снова:";
pub const CANCELLED_DIMENSIONS: &str = "❌ Ввод размеров отменен. Выберите тип услуги:";
pub const CANCELLED_TEXTURE: &str = "❌ Ввод текстуры отменен. Выберите тип услуги:";
pub const CANCELLED: &str = "❌ Действие отменено. Чтобы начать заново, отправьте /start";
pub const UNKNOWN: &str = "Неизвестная команда. Пожалуйста, используйте /start для начала работы.";
pub const STALE_CHOICE: &str = "Этот выбор больше не актуален.";
pub const GENERIC_FAILURE: &str = "Произошла ошибка. Пожалуйста, попробуйте ещё раз.";
pub const NO_ORDERS: &str = "У вас пока нет заказов.";
pub const HELP: &str = "Доступные команды:\n\
/start - начать работу\n\
/new_order - новый заказ\n\
/orders - мои заказы\n\
/cancel - отменить текущее действие\n\
/help - эта справка";

pub fn reply(rows: &[&[&str]]) -> Keyboard {
    Keyboard::Reply(
        rows.iter()
            .map(|row| row.iter().map(|t| ReplyButton::text(*t)).collect())
            .collect(),
    )
}

pub fn continue_keyboard() -> Keyboard {
    reply(&[&[buttons::CONTINUE]])
}

pub fn place_order_keyboard() -> Keyboard {
    reply(&[&[buttons::PLACE_ORDER]])
}

pub fn cancel_keyboard() -> Keyboard {
    reply(&[&[buttons::CANCEL]])
}

pub fn back_keyboard() -> Keyboard {
    reply(&[&[buttons::BACK]])
}

/// One row per catalog material, then the custom branch and cancel.
pub fn service_keyboard(materials: &[Material]) -> Keyboard {
    let mut rows: Vec<Vec<ReplyButton>> = materials
        .iter()
        .map(|m| vec![ReplyButton::text(m.name.clone())])
        .collect();
    rows.push(vec![ReplyButton::text(buttons::OTHER_TEXTURE)]);
    rows.push(vec![ReplyButton::text(buttons::CANCEL)]);
    Keyboard::Reply(rows)
}

/// Inline material picker with the price each material would cost.
pub fn material_picker(quotes: &[(Material, f64)]) -> Keyboard {
    Keyboard::Inline(
        quotes
            .iter()
            .map(|(m, price)| {
                vec![InlineButton::new(
                    format!("{} - {}", m.name, money(*price)),
                    format!("texture:{}", m.id),
                )]
            })
            .collect(),
    )
}

pub fn date_keyboard() -> Keyboard {
    reply(&[
        &[buttons::TODAY, buttons::TOMORROW],
        &[buttons::MANUAL_DATE],
        &[buttons::CANCEL],
    ])
}

pub fn date_confirmation_keyboard() -> Keyboard {
    reply(&[&[buttons::CHANGE_DATE, buttons::CONFIRM_DATE], &[buttons::CANCEL]])
}

pub fn contact_method_keyboard() -> Keyboard {
    reply(&[
        &[buttons::SEND_CONTACT],
        &[buttons::ENTER_MANUALLY],
        &[buttons::BACK],
    ])
}

pub fn share_contact_keyboard() -> Keyboard {
    Keyboard::Reply(vec![
        vec![ReplyButton::contact(buttons::SHARE_CONTACT)],
        vec![ReplyButton::text(buttons::BACK)],
    ])
}

pub fn main_menu(phone: Option<&str>) -> String {
    let phone = phone.map_or_else(|| "не указан".to_string(), format_phone);
    format!("🏠 Главное меню\n\nВаш контактный номер: {phone}\nВыберите действие:")
}

pub fn quote(width: u32, height: u32, material: &str, price: &str) -> String {
    format!(
        "📏 Размер: {width}×{height} см\n🧵 Материал: {material}\n💵 Стоимость: {price}\n\n{ASK_DATE}"
    )
}

/// Material picker intro for the custom branch. `estimate` is the price at
/// the default material rate.
pub fn pick_material(material: &str, width: u32, height: u32, estimate: Option<&str>) -> String {
    match estimate {
        Some(estimate) => format!(
            "Ориентировочная стоимость изделия «{material}» {width}×{height} см: {estimate}\n\n{PICK_MATERIAL}"
        ),
        None => PICK_MATERIAL.to_string(),
    }
}

pub fn material_chosen(material: &str, price: &str) -> String {
    format!("Вы выбрали материал: {material}\n💵 Стоимость: {price}\n\n{ASK_DATE}")
}

pub fn date_chosen(date: &str, working_days: u32) -> String {
    format!(
        "Отлично! Вы выбрали дату: {date}\n\
         До этой даты {working_days} рабочих дней (без учёта выходных и праздников)."
    )
}

pub fn order_confirmation(order: &Order) -> String {
    let mut text = format!(
        "✅ Ваш заказ #{} оформлен!\n\n\
         Размер: {}×{} см\n\
         Материал: {}\n\
         Стоимость: {}\n",
        order.id,
        order.width_cm,
        order.height_cm,
        order.texture_name,
        money(order.breakdown.final_price),
    );
    if let Some(date) = &order.delivery_date {
        text.push_str(&format!("Дата: {date}\n"));
    }
    text.push_str("\nС вами свяжутся в ближайшее время.");
    text
}

/// Line in the `/orders` list.
pub fn order_line(order: &Order) -> String {
    format!(
        "#{} · {}×{} см · {} · {} · {}",
        order.id,
        order.width_cm,
        order.height_cm,
        order.texture_name,
        money(order.breakdown.final_price),
        order.status.label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_keyboard_lists_catalog_then_extras() {
        let materials = vec![Material {
            id: "a".into(),
            name: "Замша".into(),
            price_per_dm2: 30.0,
            image_url: None,
            in_stock: true,
        }];
        let Keyboard::Reply(rows) = service_keyboard(&materials) else {
            panic!("expected reply keyboard");
        };
        let labels: Vec<&str> = rows.iter().map(|r| r[0].text.as_str()).collect();
        assert_eq!(labels, ["Замша", buttons::OTHER_TEXTURE, buttons::CANCEL]);
    }

    #[test]
    fn picker_carries_texture_callbacks() {
        let m = Material {
            id: "tex-9".into(),
            name: "Замша".into(),
            price_per_dm2: 30.0,
            image_url: None,
            in_stock: true,
        };
        let Keyboard::Inline(rows) = material_picker(&[(m, 1500.0)]) else {
            panic!("expected inline keyboard");
        };
        assert_eq!(rows[0][0].data, "texture:tex-9");
        assert!(rows[0][0].text.contains("1500.00 ₽"));
    }

    #[test]
    fn share_contact_requests_the_phone() {
        let Keyboard::Reply(rows) = share_contact_keyboard() else {
            panic!("expected reply keyboard");
        };
        assert!(rows[0][0].request_contact);
        assert!(!rows[1][0].request_contact);
    }

    #[test]
    fn main_menu_formats_phone() {
        assert!(main_menu(Some("+79161234567")).contains("+7 (916) 123-45-67"));
        assert!(main_menu(None).contains("не указан"));
    }
}
