// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and conversion into gateway events.
//!
//! Only private chats reach the intake flow. Text, commands, shared contacts
//! and callback queries become [`InboundEvent`]s; everything else is dropped.

use atelier_core::types::{EventKind, InboundEvent, MessageId, UserId};
use teloxide::types::{CallbackQuery, ChatKind, Message, User};

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Splits `/name@bot arg1 arg2` into a lowercased name and its arguments.
///
/// Returns `None` when `text` is not a command.
pub fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let rest = text.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), parts.map(str::to_string).collect()))
}

fn sender(user: &User) -> UserId {
    UserId(user.id.0 as i64)
}

/// Converts a message into an event.
///
/// Returns `None` for messages without a sender and for message types the
/// intake flow does not understand (stickers, photos, locations).
pub fn to_inbound_event(msg: &Message) -> Option<InboundEvent> {
    let from = msg.from.as_ref()?;
    let kind = if let Some(contact) = msg.contact() {
        EventKind::Contact {
            phone: contact.phone_number.clone(),
        }
    } else {
        let text = msg.text()?;
        match parse_command(text) {
            Some((name, args)) => EventKind::Command { name, args },
            None => EventKind::Text(text.to_string()),
        }
    };
    Some(InboundEvent {
        user_id: sender(from),
        username: from.username.clone(),
        kind,
    })
}

/// Converts an inline button press into an event. Queries without data are dropped.
pub fn callback_to_event(query: &CallbackQuery) -> Option<InboundEvent> {
    let data = query.data.clone()?;
    Some(InboundEvent {
        user_id: sender(&query.from),
        username: query.from.username.clone(),
        kind: EventKind::Callback {
            data,
            message_id: query.message.as_ref().map(|m| MessageId(m.id().0)),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_json(user_id: u64, username: Option<&str>) -> serde_json::Value {
        let mut from = serde_json::json!({
            "id": user_id,
            "is_bot": false,
            "first_name": "Test",
        });
        if let Some(name) = username {
            from["username"] = name.into();
        }
        from
    }

    fn private_message(user_id: u64, username: Option<&str>, extra: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 7,
            "date": 1700000000i64,
            "chat": {
                "id": user_id as i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": user_json(user_id, username),
        });
        for (k, v) in extra.as_object().unwrap() {
            json[k] = v.clone();
        }
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn text_message(user_id: u64, text: &str) -> Message {
        private_message(user_id, Some("buyer"), serde_json::json!({ "text": text }))
    }

    fn group_message(user_id: u64, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Workshop",
            },
            "from": user_json(user_id, None),
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize mock group message")
    }

    #[test]
    fn private_chats_only() {
        assert!(is_dm(&text_message(12345, "hi")));
        assert!(!is_dm(&group_message(12345, "hi")));
    }

    #[test]
    fn commands_are_parsed() {
        assert_eq!(parse_command("/start"), Some(("start".into(), vec![])));
        assert_eq!(
            parse_command("/Status@atelier_bot 12 completed"),
            Some(("status".into(), vec!["12".into(), "completed".into()]))
        );
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("30 40"), None);
    }

    #[test]
    fn text_becomes_text_event() {
        let event = to_inbound_event(&text_message(12345, "30 40")).unwrap();
        assert_eq!(event.user_id, UserId(12345));
        assert_eq!(event.username.as_deref(), Some("buyer"));
        assert_eq!(event.kind, EventKind::Text("30 40".into()));
    }

    #[test]
    fn command_becomes_command_event() {
        let event = to_inbound_event(&text_message(1, "/export 5")).unwrap();
        assert_eq!(
            event.kind,
            EventKind::Command {
                name: "export".into(),
                args: vec!["5".into()],
            }
        );
    }

    #[test]
    fn shared_contact_becomes_contact_event() {
        let msg = private_message(
            12345,
            None,
            serde_json::json!({
                "contact": {
                    "phone_number": "79161234567",
                    "first_name": "Test",
                    "user_id": 12345,
                }
            }),
        );
        let event = to_inbound_event(&msg).unwrap();
        assert_eq!(
            event.kind,
            EventKind::Contact {
                phone: "79161234567".into()
            }
        );
        assert!(event.username.is_none());
    }

    #[test]
    fn unsupported_messages_are_dropped() {
        let msg = private_message(
            12345,
            None,
            serde_json::json!({
                "location": { "latitude": 55.75, "longitude": 37.61 }
            }),
        );
        assert!(to_inbound_event(&msg).is_none());
    }

    #[test]
    fn callback_carries_data_and_message() {
        let query: CallbackQuery = serde_json::from_value(serde_json::json!({
            "id": "4382bfdwdsb323b2d9",
            "from": user_json(12345, Some("buyer")),
            "chat_instance": "-42",
            "data": "texture:11111111-1111-1111-1111-111111111111",
            "message": {
                "message_id": 99,
                "date": 1700000000i64,
                "chat": { "id": 12345i64, "type": "private", "first_name": "Test" },
                "text": "Выберите материал",
            },
        }))
        .unwrap();
        let event = callback_to_event(&query).unwrap();
        assert_eq!(event.user_id, UserId(12345));
        assert_eq!(
            event.kind,
            EventKind::Callback {
                data: "texture:11111111-1111-1111-1111-111111111111".into(),
                message_id: Some(MessageId(99)),
            }
        );
    }

    #[test]
    fn callback_without_data_is_dropped() {
        let query: CallbackQuery = serde_json::from_value(serde_json::json!({
            "id": "1",
            "from": user_json(1, None),
            "chat_instance": "-42",
            "game_short_name": "x",
        }))
        .unwrap();
        assert!(callback_to_event(&query).is_none());
    }
}
