//! Email address validation
//!
//! Validation is pattern-based (RFC 5322 shaped, not a full grammar) with a
//! small table of common domain typos that get a correction hint instead of a
//! plain pass.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const MAX_ADDRESS_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

/// Misspelled domain → intended domain
const DOMAIN_TYPOS: &[(&str, &str)] = &[
    ("gmail.con", "gmail.com"),
    ("gmial.com", "gmail.com"),
    ("gmai.com", "gmail.com"),
    ("gmal.com", "gmail.com"),
    ("gmail.co", "gmail.com"),
    ("yahooo.com", "yahoo.com"),
    ("yaho.com", "yahoo.com"),
    ("hotmial.com", "hotmail.com"),
    ("hotmal.com", "hotmail.com"),
    ("outlok.com", "outlook.com"),
];

/// Outcome of [`validate_email_address`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "suggestion", rename_all = "snake_case")]
pub enum EmailValidationResult {
    Valid,
    Invalid,
    /// Well-formed, but the domain is a known typo of the carried domain
    InvalidWithSuggestion(String),
}

impl EmailValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, EmailValidationResult::Valid)
    }

    /// Corrected domain, if any
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            EmailValidationResult::InvalidWithSuggestion(domain) => Some(domain),
            _ => None,
        }
    }
}

/// Validate a candidate email address.
///
/// Never fails: malformed input is reported as [`EmailValidationResult::Invalid`].
pub fn validate_email_address(candidate: &str) -> EmailValidationResult {
    let trimmed = candidate.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_ADDRESS_LEN {
        return EmailValidationResult::Invalid;
    }

    if !EMAIL_PATTERN.is_match(trimmed) {
        return EmailValidationResult::Invalid;
    }

    let Some((local, domain)) = trimmed.rsplit_once('@') else {
        return EmailValidationResult::Invalid;
    };

    if local.len() > MAX_LOCAL_PART_LEN {
        return EmailValidationResult::Invalid;
    }

    // Top-level label must be alphabetic and at least two characters
    let tld = domain.rsplit('.').next().unwrap_or_default();
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return EmailValidationResult::Invalid;
    }

    let domain = domain.to_ascii_lowercase();
    if let Some((_, corrected)) = DOMAIN_TYPOS.iter().find(|(typo, _)| *typo == domain) {
        return EmailValidationResult::InvalidWithSuggestion((*corrected).to_string());
    }

    EmailValidationResult::Valid
}

/// Trim and lowercase. Does not re-validate.
pub fn sanitize_email_address(candidate: &str) -> String {
    candidate.trim().to_lowercase()
}

/// Rebuild a full address using the suggested domain, for "did you mean" prompts.
pub fn suggested_address(candidate: &str, corrected_domain: &str) -> Option<String> {
    let (local, _) = candidate.trim().rsplit_once('@')?;
    Some(format!("{}@{}", local, corrected_domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        for addr in [
            "user@example.com",
            "first.last+tag@sub.example.co.uk",
            "  padded@example.org  ",
            "o'brien@example.ie",
        ] {
            assert_eq!(validate_email_address(addr), EmailValidationResult::Valid, "{}", addr);
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for addr in [
            "",
            "   ",
            "no-at-sign",
            "user@",
            "@example.com",
            "user@localhost",
            "user@-example.com",
            "user@example-.com",
            "user@exa mple.com",
            "user@example.c",
            "user@example.123",
        ] {
            assert_eq!(validate_email_address(addr), EmailValidationResult::Invalid, "{}", addr);
        }
    }

    #[test]
    fn rejects_overlong_parts() {
        let long_label = "a".repeat(64);
        assert_eq!(
            validate_email_address(&format!("user@{}.com", long_label)),
            EmailValidationResult::Invalid
        );

        let long_local = "a".repeat(65);
        assert_eq!(
            validate_email_address(&format!("{}@example.com", long_local)),
            EmailValidationResult::Invalid
        );

        let long_address = format!("user@{}.com", ["abc"; 70].join("."));
        assert!(long_address.len() > 254);
        assert_eq!(validate_email_address(&long_address), EmailValidationResult::Invalid);
    }

    #[test]
    fn suggests_corrections_for_known_typos() {
        assert_eq!(
            validate_email_address("user@gmail.con"),
            EmailValidationResult::InvalidWithSuggestion("gmail.com".to_string())
        );
        assert_eq!(
            validate_email_address("someone@YAHOOO.COM"),
            EmailValidationResult::InvalidWithSuggestion("yahoo.com".to_string())
        );
        let result = validate_email_address("a@hotmial.com");
        assert_eq!(result.suggestion(), Some("hotmail.com"));
        assert!(!result.is_valid());
    }

    #[test]
    fn suggested_address_keeps_local_part() {
        assert_eq!(
            suggested_address(" Jane.Doe@gmial.com ", "gmail.com").as_deref(),
            Some("Jane.Doe@gmail.com")
        );
        assert_eq!(suggested_address("nope", "gmail.com"), None);
    }

    #[test]
    fn sanitize_trims_and_lowercases() {
        assert_eq!(sanitize_email_address("  User@Example.COM "), "user@example.com");
    }
}
