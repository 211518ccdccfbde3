//! HTTP Client Utilities
//!
//! Shared HTTP client creation with consistent configuration.

use std::time::Duration;

use super::error::ApiError;

/// Request timeout applied to every Google API call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create a reqwest HTTP client with standard configuration
///
/// - 30 second request timeout
/// - 10 second connect timeout
/// - Reusable across requests
pub fn create_http_client() -> Result<reqwest::Client, ApiError> {
    create_http_client_with_timeout(REQUEST_TIMEOUT)
}

/// Create a reqwest HTTP client with a custom request timeout
pub fn create_http_client_with_timeout(timeout: Duration) -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| ApiError::network(format!("Failed to build HTTP client: {}", e)))
}
