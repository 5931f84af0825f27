// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input validation for the intake steps: dimensions, delivery dates and
//! phone numbers.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use thiserror::Error;

pub const MAX_WIDTH_CM: u32 = 80;
pub const MAX_HEIGHT_CM: u32 = 50;

/// Display and storage format of delivery dates.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DimensionError {
    #[error("expected two whitespace-separated integers")]
    Format,
    #[error("width {0} outside 1..={MAX_WIDTH_CM}")]
    Width(u32),
    #[error("height {0} outside 1..={MAX_HEIGHT_CM}")]
    Height(u32),
}

impl DimensionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Format => "Неверный формат. Введите ширину и длину через пробел (например: 30 40)",
            Self::Width(_) => "Некорректная ширина. Допустимый диапазон: 1-80 см",
            Self::Height(_) => "Некорректная длина. Допустимый диапазон: 1-50 см",
        }
    }
}

/// Parses `"<width> <height>"` in centimetres.
pub fn parse_dimensions(input: &str) -> Result<(u32, u32), DimensionError> {
    let mut parts = input.split_whitespace();
    let (Some(w), Some(h), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(DimensionError::Format);
    };
    let width: u32 = w.parse().map_err(|_| DimensionError::Format)?;
    let height: u32 = h.parse().map_err(|_| DimensionError::Format)?;

    if !(1..=MAX_WIDTH_CM).contains(&width) {
        return Err(DimensionError::Width(width));
    }
    if !(1..=MAX_HEIGHT_CM).contains(&height) {
        return Err(DimensionError::Height(height));
    }
    Ok((width, height))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("date is not in DD.MM.YYYY form")]
    Format,
    #[error("date is in the past")]
    Past,
}

impl DateError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Format => "Неверный формат даты. Пожалуйста, введите дату в формате ДД.ММ.ГГГГ",
            Self::Past => "Пожалуйста, выберите дату в будущем",
        }
    }
}

/// Parses a manually entered `DD.MM.YYYY` date, expanding the `DD.MM.YY`
/// shorthand to the 2000s. Dates before `today` are rejected.
pub fn parse_manual_date(input: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let input = input.trim();
    let expanded = expand_short_year(input);
    let date = NaiveDate::parse_from_str(expanded.as_deref().unwrap_or(input), DATE_FORMAT)
        .map_err(|_| DateError::Format)?;
    if date < today {
        return Err(DateError::Past);
    }
    Ok(date)
}

fn expand_short_year(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    if bytes.len() == 8 && bytes[2] == b'.' && bytes[5] == b'.' {
        Some(format!("{}20{}", &input[..6], &input[6..]))
    } else {
        None
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn tomorrow(today: NaiveDate) -> NaiveDate {
    today.checked_add_days(Days::new(1)).unwrap_or(today)
}

/// Weekdays (Mon-Fri) in `[from, to)`. Holidays are not accounted for.
pub fn working_days_between(from: NaiveDate, to: NaiveDate) -> u32 {
    from.iter_days()
        .take_while(|d| *d < to)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

/// Normalizes a phone number.
///
/// Non-digits are stripped. Russian numbers written with a leading `8`, a
/// leading `7` or as a bare ten-digit `9xx` number become `+7XXXXXXXXXX`.
/// Anything else keeps a leading `+` if the input had one.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    match (digits.as_bytes().first(), digits.len()) {
        (Some(b'7'), 11) => format!("+{digits}"),
        (Some(b'8'), 11) => format!("+7{}", &digits[1..]),
        (Some(b'9'), 10) => format!("+7{digits}"),
        _ if raw.trim_start().starts_with('+') => format!("+{digits}"),
        _ => digits,
    }
}

/// Checks a normalized phone number: leading `+`, 10 to 15 digits, and not
/// an obviously fake sequence.
pub fn is_valid_phone(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };
    if !(10..=15).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if is_fake_sequence(digits) {
        return false;
    }
    match digits.strip_prefix('7') {
        Some(national) if digits.len() == 11 => !is_fake_sequence(national),
        _ => true,
    }
}

/// All-same digits, or a run stepping by one in either direction (mod 10).
fn is_fake_sequence(digits: &str) -> bool {
    let d: Vec<u8> = digits.bytes().map(|b| b - b'0').collect();
    let steps = |delta: u8| d.windows(2).all(|w| w[1] == (w[0] + delta) % 10);
    steps(0) || steps(1) || steps(9)
}

/// Formats Russian numbers as `+7 (XXX) XXX-XX-XX`; others are returned as is.
pub fn format_phone(phone: &str) -> String {
    if phone.len() == 12 && phone.starts_with("+7") && phone[1..].bytes().all(|b| b.is_ascii_digit())
    {
        format!(
            "{} ({}) {}-{}-{}",
            &phone[..2],
            &phone[2..5],
            &phone[5..8],
            &phone[8..10],
            &phone[10..12]
        )
    } else {
        phone.to_string()
    }
}
