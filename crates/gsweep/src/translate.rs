//! Error Translator
//!
//! Turns an [`ApiError`] into one sentence from a fixed vocabulary. Upstream
//! payloads, URLs and stack detail never make it into the returned text; in
//! development mode the full error is logged at debug level instead.

use std::fmt;

use tracing::{debug, warn};

use crate::common::{ApiError, ErrorKind};

const INVALID_REQUEST: &str = "Invalid request. Please check your input and try again.";
const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";
const PERMISSION_DENIED: &str = "Permission denied. You may not have access to this item.";
const NOT_FOUND: &str = "The requested item was not found.";
const CONFLICT: &str = "A conflict occurred. Please refresh and try again.";
const TOO_MANY_REQUESTS: &str = "Too many requests. Please wait a moment and try again.";
const UNAVAILABLE: &str = "The service is temporarily unavailable. Please try again later.";

const NETWORK: &str = "Network error. Please check your connection and try again.";
const QUOTA: &str = "API quota exceeded. Please try again later.";
const TIMEOUT: &str = "The request timed out. Please try again.";
const SECURITY: &str = "Security verification failed. Please sign in again.";
const UNEXPECTED: &str = "An unexpected error occurred. Please try again.";

fn status_message(status: u16) -> Option<&'static str> {
    match status {
        400 => Some(INVALID_REQUEST),
        401 => Some(SESSION_EXPIRED),
        403 => Some(PERMISSION_DENIED),
        404 => Some(NOT_FOUND),
        409 => Some(CONFLICT),
        429 => Some(TOO_MANY_REQUESTS),
        500 | 503 => Some(UNAVAILABLE),
        _ => None,
    }
}

fn kind_message(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::Network => Some(NETWORK),
        ErrorKind::Quota => Some(QUOTA),
        ErrorKind::Timeout => Some(TIMEOUT),
        ErrorKind::Permission => Some(PERMISSION_DENIED),
        ErrorKind::RateLimited => Some(TOO_MANY_REQUESTS),
        ErrorKind::Security => Some(SECURITY),
        _ => None,
    }
}

/// Keyword fallback, checked in priority order
fn keyword_message(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    if lower.contains("network") || lower.contains("fetch") {
        Some(NETWORK)
    } else if lower.contains("quota") {
        Some(QUOTA)
    } else if lower.contains("timeout") || lower.contains("timed out") {
        Some(TIMEOUT)
    } else if lower.contains("permission") {
        Some(PERMISSION_DENIED)
    } else {
        None
    }
}

/// Build the user-facing sentence for `err` in the context of `context`
/// (e.g. "Search", "Delete files").
///
/// Lookup order: HTTP status table, error kind, message keywords, generic.
/// Validation errors carry a message written locally for the user and are
/// passed through.
pub fn to_user_message(err: &ApiError, context: &str) -> String {
    if let Some(msg) = err.status.and_then(status_message) {
        return format!("{} failed: {}", context, msg);
    }
    if err.kind == ErrorKind::Validation {
        return format!("{} failed: {}", context, err.message);
    }
    let msg = kind_message(err.kind)
        .or_else(|| keyword_message(&err.message))
        .unwrap_or(UNEXPECTED);
    format!("{} failed: {}", context, msg)
}

/// Translator that also routes full error detail to the log in development.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    dev_mode: bool,
}

impl Translator {
    pub fn new(dev_mode: bool) -> Self {
        Self { dev_mode }
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    pub fn to_user_message(&self, err: &ApiError, context: &str) -> String {
        if self.dev_mode {
            debug!(target: "gsweep::dev", context, error = %err, "Operation failed");
        } else {
            warn!(context, kind = %err.kind, status = ?err.status, "Operation failed");
        }
        to_user_message(err, context)
    }

    /// Wrap `err` into the error type handed back to callers.
    pub fn user_error(&self, err: ApiError, context: &str) -> UserFacingError {
        UserFacingError {
            message: self.to_user_message(&err, context),
            source: err,
        }
    }
}

/// What a failed operation returns to the UI layer: a safe sentence, with the
/// original error kept only for programmatic inspection.
#[derive(Debug, Clone)]
pub struct UserFacingError {
    pub message: String,
    pub source: ApiError,
}

impl UserFacingError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind
    }
}

impl fmt::Display for UserFacingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for UserFacingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        let cases = [
            (400, INVALID_REQUEST),
            (401, SESSION_EXPIRED),
            (403, PERMISSION_DENIED),
            (404, NOT_FOUND),
            (409, CONFLICT),
            (429, TOO_MANY_REQUESTS),
            (500, UNAVAILABLE),
            (503, UNAVAILABLE),
        ];
        for (status, expected) in cases {
            let err = ApiError::http(status, "upstream said something");
            assert_eq!(
                to_user_message(&err, "Search"),
                format!("Search failed: {}", expected)
            );
        }
    }

    #[test]
    fn kinds_without_status() {
        assert_eq!(
            to_user_message(&ApiError::network("dns failure"), "Share"),
            format!("Share failed: {}", NETWORK)
        );
        assert_eq!(
            to_user_message(&ApiError::timeout("deadline"), "Share"),
            format!("Share failed: {}", TIMEOUT)
        );
        assert_eq!(
            to_user_message(&ApiError::quota("daily limit"), "Share"),
            format!("Share failed: {}", QUOTA)
        );
        assert_eq!(
            to_user_message(&ApiError::security("state mismatch"), "Sign in"),
            format!("Sign in failed: {}", SECURITY)
        );
    }

    #[test]
    fn keyword_priority() {
        let err = ApiError::new(ErrorKind::Other, "Failed to fetch: quota");
        assert_eq!(to_user_message(&err, "Load"), format!("Load failed: {}", NETWORK));

        let err = ApiError::new(ErrorKind::Other, "Quota hit after timeout");
        assert_eq!(to_user_message(&err, "Load"), format!("Load failed: {}", QUOTA));

        let err = ApiError::new(ErrorKind::Other, "Request TIMEOUT");
        assert_eq!(to_user_message(&err, "Load"), format!("Load failed: {}", TIMEOUT));

        let err = ApiError::new(ErrorKind::Other, "missing permission on parent");
        assert_eq!(
            to_user_message(&err, "Load"),
            format!("Load failed: {}", PERMISSION_DENIED)
        );
    }

    #[test]
    fn unknown_status_falls_through_to_generic() {
        let err = ApiError::http(502, "<html>Bad Gateway at 10.0.0.3</html>");
        let msg = to_user_message(&err, "Delete files");
        assert_eq!(msg, format!("Delete files failed: {}", UNEXPECTED));
        assert!(!msg.contains("10.0.0.3"));
    }

    #[test]
    fn never_leaks_upstream_text() {
        let secret = "token ya29.abcdef at /srv/app.rs:42";
        for err in [
            ApiError::http(404, secret),
            ApiError::network(secret),
            ApiError::decode(secret),
            ApiError::new(ErrorKind::Other, secret),
        ] {
            assert!(!to_user_message(&err, "Op").contains("ya29"));
        }
    }

    #[test]
    fn validation_messages_pass_through() {
        let err = ApiError::validation("Did you mean user@gmail.com?");
        assert_eq!(
            to_user_message(&err, "Share"),
            "Share failed: Did you mean user@gmail.com?"
        );
    }

    #[test]
    fn user_error_keeps_source() {
        let translator = Translator::new(true);
        let err = translator.user_error(ApiError::http(401, "expired"), "Search");
        assert_eq!(err.to_string(), format!("Search failed: {}", SESSION_EXPIRED));
        assert_eq!(err.source.status, Some(401));
        assert_eq!(err.kind(), ErrorKind::Http);
    }
}
