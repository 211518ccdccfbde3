//! Common Error Types
//!
//! A single discriminated error for everything that can go wrong around a
//! remote call. Errors are built once at the boundary (HTTP client, limiter,
//! state guard, sanitizer callers) and never inspected by string probing
//! afterwards.

use std::fmt;

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Non-success HTTP status from a Google API
    Http,
    /// Connection failure, DNS, TLS, reset
    Network,
    /// Request exceeded the client timeout
    Timeout,
    /// Daily/project quota exhausted upstream
    Quota,
    /// Caller lacks access to the resource
    Permission,
    /// Local input rejected before any request was made
    Validation,
    /// Local rate limiter refused admission
    RateLimited,
    /// OAuth state mismatch or expiry
    Security,
    /// Response body did not have the expected shape
    Decode,
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Http => "http",
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Quota => "quota",
            ErrorKind::Permission => "permission",
            ErrorKind::Validation => "validation",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Security => "security",
            ErrorKind::Decode => "decode",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by a governed or remote operation.
///
/// `message` is internal detail. It may contain upstream payload text and is
/// never shown to users directly; see [`crate::translate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Create an error for a non-success HTTP response
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Http, message).with_status(status)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Quota, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Security, message)
    }

    /// Create a local admission-denied error for a limiter bucket
    pub fn rate_limited(bucket: &str) -> Self {
        Self::new(
            ErrorKind::RateLimited,
            format!("Rate limit exceeded for '{}'", bucket),
        )
        .with_status(429)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ErrorKind::RateLimited || self.status == Some(429)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{} {}] {}", self.kind, status, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::timeout(format!("HTTP request timed out: {}", err));
        }
        if err.is_decode() {
            return Self::decode(format!("Failed to decode response: {}", err));
        }
        if let Some(status) = err.status() {
            return Self::http(status.as_u16(), format!("HTTP request failed: {}", err));
        }
        Self::network(format!("HTTP request failed: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(format!("Failed to parse JSON response: {}", err))
    }
}
