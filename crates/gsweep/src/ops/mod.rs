//! Governed operations
//!
//! The entry points a UI calls. Each one sanitizes its input, passes the
//! relevant rate limiter, calls the remote service and hands back either the
//! result or a [`UserFacingError`] produced by the translator.

pub mod drive;
pub mod gmail;

pub use drive::DriveOps;
pub use gmail::GmailOps;

use crate::bulk::{check_size, BulkError};
use crate::common::ApiError;
use crate::sanitize::{
    sanitize_email_address, suggested_address, validate_email_address, EmailValidationResult,
};

/// Size pre-check for caller-supplied id lists
pub(crate) fn check_selection(count: usize) -> Result<(), ApiError> {
    check_size(count).map_err(|e| match e {
        BulkError::NothingToDo => ApiError::validation("No items selected."),
        other => other.into(),
    })
}

/// Validate a recipient address, returning its normalized form
pub(crate) fn checked_email(candidate: &str) -> Result<String, ApiError> {
    match validate_email_address(candidate) {
        EmailValidationResult::Valid => Ok(sanitize_email_address(candidate)),
        EmailValidationResult::InvalidWithSuggestion(domain) => {
            let suggestion = suggested_address(&sanitize_email_address(candidate), &domain)
                .unwrap_or(domain);
            Err(ApiError::validation(format!(
                "That email address looks mistyped. Did you mean {}?",
                suggestion
            )))
        }
        EmailValidationResult::Invalid => {
            Err(ApiError::validation("Please enter a valid email address."))
        }
    }
}
