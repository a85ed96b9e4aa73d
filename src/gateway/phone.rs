//! Phone number normalization.
//!
//! Numbers are assumed to be Indonesian: a national number with a trunk `0`
//! gets the `62` country code instead, and anything not already starting with
//! `62` gets it prepended. Numbers in another country's format come out wrong;
//! callers are expected to send Indonesian numbers.

use crate::types::Jid;

pub const COUNTRY_CODE: &str = "62";

/// Reduce `raw` to digits and put it in `62…` international form.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if let Some(rest) = digits.strip_prefix('0') {
        format!("{}{}", COUNTRY_CODE, rest)
    } else if digits.starts_with(COUNTRY_CODE) {
        digits
    } else {
        format!("{}{}", COUNTRY_CODE, digits)
    }
}

/// Chat identifier for a normalized number.
pub fn chat_id(normalized: &str) -> Jid {
    Jid::user(normalized)
}
