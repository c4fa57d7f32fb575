//! Small text utilities offered next to the cleaner: UUIDs, Base64 and chat
//! links built from a phone number or a username.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use std::ops::RangeInclusive;

/// Digits accepted for a phone number, wide enough for every country code.
pub const PHONE_DIGITS: RangeInclusive<usize> = 7..=18;
pub const USERNAME_LEN: RangeInclusive<usize> = 4..=40;

lazy_static! {
    static ref NON_DIGIT: Regex = Regex::new(r"[^0-9]").unwrap();
    static ref USERNAME: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded data is not text: {0}")]
    NotText(#[from] std::string::FromUtf8Error),
    #[error("invalid phone number length: {0} digits")]
    PhoneLength(usize),
    #[error("invalid username")]
    Username,
    #[error("invalid characters in username")]
    UsernameChars,
}

/// A random version 4 UUID in the hyphenated lower case form.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn encode_base64(input: &str) -> String {
    BASE64.encode(input)
}

pub fn decode_base64(input: &str) -> Result<String, ToolError> {
    let data = BASE64.decode(input)?;
    Ok(String::from_utf8(data)?)
}

/// Build a `wa.me` link. Everything but digits is dropped, so `+`, dashes
/// and spaces are fine; the country code has to be part of the input.
pub fn whatsapp_link(input: &str) -> Result<String, ToolError> {
    let number = NON_DIGIT.replace_all(input, "");
    if !PHONE_DIGITS.contains(&number.len()) {
        return Err(ToolError::PhoneLength(number.len()));
    }
    Ok(format!("https://wa.me/{number}"))
}

/// Build a `t.me` link from a username, with or without the leading `@`.
pub fn telegram_link(input: &str) -> Result<String, ToolError> {
    let trimmed = input.trim();
    let name = trimmed.strip_prefix('@').unwrap_or(trimmed);

    if !USERNAME_LEN.contains(&name.len()) || name.contains(' ') {
        return Err(ToolError::Username);
    }
    if !USERNAME.is_match(name) {
        return Err(ToolError::UsernameChars);
    }
    Ok(format!("https://t.me/{name}"))
}
