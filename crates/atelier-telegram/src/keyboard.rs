// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of gateway keyboards into Bot API reply markup.

use atelier_core::types::{InlineButton, Keyboard, ReplyButton};
use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    KeyboardRemove, ReplyMarkup,
};

fn reply_button(button: &ReplyButton) -> KeyboardButton {
    let b = KeyboardButton::new(button.text.clone());
    if button.request_contact {
        b.request(ButtonRequest::Contact)
    } else {
        b
    }
}

fn inline_button(button: &InlineButton) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(button.text.clone(), button.data.clone())
}

/// Markup to attach to an outgoing message; `None` leaves the client's keyboard as is.
pub fn to_reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::None => None,
        Keyboard::Reply(rows) => {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(reply_button).collect::<Vec<_>>());
            Some(ReplyMarkup::Keyboard(
                KeyboardMarkup::new(rows).resize_keyboard(),
            ))
        }
        Keyboard::Inline(rows) => {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(inline_button).collect::<Vec<_>>());
            Some(ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows)))
        }
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn none_keeps_client_keyboard() {
        assert!(to_reply_markup(&Keyboard::None).is_none());
    }

    #[test]
    fn reply_keyboard_keeps_layout_and_contact_request() {
        let keyboard = Keyboard::Reply(vec![
            vec![ReplyButton::contact("📱 Поделиться контактом")],
            vec![ReplyButton::text("Назад")],
        ]);
        let Some(ReplyMarkup::Keyboard(markup)) = to_reply_markup(&keyboard) else {
            panic!("expected reply keyboard");
        };
        assert_eq!(markup.keyboard.len(), 2);
        assert_eq!(markup.keyboard[0][0].text, "📱 Поделиться контактом");
        assert!(matches!(
            markup.keyboard[0][0].request,
            Some(ButtonRequest::Contact)
        ));
        assert!(markup.keyboard[1][0].request.is_none());
    }

    #[test]
    fn inline_keyboard_carries_callback_data() {
        let keyboard = Keyboard::Inline(vec![vec![InlineButton::new(
            "Замша - 600.00 ₽",
            "texture:33333333-3333-3333-3333-333333333333",
        )]]);
        let Some(ReplyMarkup::InlineKeyboard(markup)) = to_reply_markup(&keyboard) else {
            panic!("expected inline keyboard");
        };
        assert_eq!(
            markup.inline_keyboard[0][0].kind,
            InlineKeyboardButtonKind::CallbackData(
                "texture:33333333-3333-3333-3333-333333333333".into()
            )
        );
    }

    #[test]
    fn remove_hides_keyboard() {
        assert!(matches!(
            to_reply_markup(&Keyboard::Remove),
            Some(ReplyMarkup::KeyboardRemove(_))
        ));
    }
}
