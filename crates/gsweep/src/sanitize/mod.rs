//! Input Sanitizer
//!
//! Everything a user types passes through here before it reaches a Google
//! query language, a URL or a file name. These are pure functions: they never
//! fail and never panic. Bad input degrades to a safe value (empty string,
//! `None`, `Invalid`) and the caller decides what to tell the user.

pub mod email;
pub mod identifiers;
pub mod query;

pub use email::{
    sanitize_email_address, suggested_address, validate_email_address, EmailValidationResult,
};
pub use identifiers::{
    is_trusted_google_url, sanitize_file_name, sanitize_opaque_id, sanitize_resource_id,
};
pub use query::{sanitize_drive_query_text, sanitize_gmail_query_text, MAX_QUERY_LEN};

/// Parse an integer from user input and clamp it into `[min, max]`.
///
/// Non-numeric input yields `fallback` unchanged. Digit strings too large for
/// `i64` clamp to the bound on their side.
pub fn clamp_numeric_input(value: &str, min: i64, max: i64, fallback: i64) -> i64 {
    let trimmed = value.trim();
    let parsed = match trimmed.parse::<i64>() {
        Ok(n) => n,
        Err(_) if is_integer_literal(trimmed) => {
            if trimmed.starts_with('-') {
                min
            } else {
                max
            }
        }
        Err(_) => return fallback,
    };

    if parsed < min {
        min
    } else if parsed > max {
        max
    } else {
        parsed
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Longest prefix of `s` with at most `max_chars` characters
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Longest prefix of `s` that fits in `max_bytes` without splitting a character
pub(crate) fn truncate_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
