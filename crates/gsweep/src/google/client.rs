//! Google API Authenticated HTTP Client
//!
//! Injects the bearer token, follows `nextPageToken` pagination and turns
//! Google's JSON error envelopes into typed [`ApiError`]s at the boundary.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth::AccessToken;
use crate::common::{create_http_client, ApiError, ApiResult};

/// How a list endpoint pages its results
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Response field holding the page's items ("files", "messages")
    pub items_field: &'static str,
    /// Query parameter carrying the page size ("pageSize", "maxResults")
    pub size_param: &'static str,
    /// Largest page the endpoint accepts
    pub max_page_size: usize,
}

/// Google API HTTP client with OAuth token injection
pub struct GoogleClient {
    client: Client,
    access_token: AccessToken,
}

impl GoogleClient {
    pub fn new(access_token: AccessToken) -> ApiResult<Self> {
        if access_token.is_empty() {
            return Err(ApiError::http(401, "No access token"));
        }
        Ok(Self {
            client: create_http_client()?,
            access_token,
        })
    }

    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let builder = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(self.access_token.expose());

        self.execute_request(builder).await
    }

    pub async fn post(&self, url: &str, query: &[(&str, String)], body: &Value) -> ApiResult<Value> {
        let builder = self
            .client
            .post(url)
            .query(query)
            .bearer_auth(self.access_token.expose())
            .json(body);

        self.execute_request(builder).await
    }

    pub async fn patch(&self, url: &str, query: &[(&str, String)], body: &Value) -> ApiResult<Value> {
        let builder = self
            .client
            .patch(url)
            .query(query)
            .bearer_auth(self.access_token.expose())
            .json(body);

        self.execute_request(builder).await
    }

    pub async fn delete(&self, url: &str) -> ApiResult<Value> {
        let builder = self
            .client
            .delete(url)
            .bearer_auth(self.access_token.expose());

        self.execute_request(builder).await
    }

    async fn execute_request(&self, builder: RequestBuilder) -> ApiResult<Value> {
        let response = builder.send().await?;

        let status = response.status();
        debug!("Response status: {}", status);

        let body = response.text().await?;

        if !status.is_success() {
            let err = error_from_response(status, &body);
            if err.status == Some(429) {
                warn!("Rate limited by Google API");
            } else {
                error!(kind = %err.kind, status = status.as_u16(), "Google API error");
            }
            return Err(err);
        }

        // DELETE and some POSTs answer 204 with no body
        if body.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Collect items across pages until `nextPageToken` runs out or `limit`
    /// items have been gathered.
    pub async fn get_paginated(
        &self,
        url: &str,
        base_query: &[(&str, String)],
        pagination: Pagination,
        limit: Option<usize>,
    ) -> ApiResult<Vec<Value>> {
        let limit = limit.unwrap_or(usize::MAX);
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;

        while all_items.len() < limit {
            let page_size = (limit - all_items.len()).min(pagination.max_page_size);
            let mut query = base_query.to_vec();
            query.push((pagination.size_param, page_size.to_string()));
            if let Some(ref token) = page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self.get(url, &query).await?;
            all_items.extend(extract_array(&response, pagination.items_field));

            match response.get("nextPageToken").and_then(|v| v.as_str()) {
                Some(next) => page_token = Some(next.to_string()),
                None => break,
            }
        }

        all_items.truncate(limit);
        debug!(count = all_items.len(), "Collected paginated results");
        Ok(all_items)
    }
}

/// Extract an array field from a JSON response, empty if missing.
pub fn extract_array(response: &Value, field: &str) -> Vec<Value> {
    response
        .get(field)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Build the error for a non-success response.
///
/// Google's envelope looks like
/// `{"error": {"code": 403, "message": "...", "errors": [{"reason": "..."}]}}`.
/// Quota reasons are promoted: per-user rate limits become 429, exhausted
/// daily/project quota becomes [`ErrorKind::Quota`](crate::common::ErrorKind).
pub fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error_obj = parsed.as_ref().and_then(|v| v.get("error"));

    let message = error_obj
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {} error", status));

    let reason = error_obj
        .and_then(|e| e.get("errors"))
        .and_then(|v| v.as_array())
        .and_then(|errors| errors.first())
        .and_then(|first| first.get("reason"))
        .and_then(|v| v.as_str());

    match reason {
        Some("rateLimitExceeded") | Some("userRateLimitExceeded") => ApiError::http(429, message),
        Some("quotaExceeded") | Some("dailyLimitExceeded") => ApiError::quota(message),
        _ => ApiError::http(status.as_u16(), message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;

    #[test]
    fn error_envelope_keeps_status_and_message() {
        let body = r#"{"error": {"code": 404, "message": "File not found: abc."}}"#;
        let err = error_from_response(StatusCode::NOT_FOUND, body);
        assert_eq!(err.kind, ErrorKind::Http);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.message, "File not found: abc.");
    }

    #[test]
    fn user_rate_limit_becomes_429() {
        let body = r#"{"error": {"code": 403, "message": "User Rate Limit Exceeded",
            "errors": [{"domain": "usageLimits", "reason": "userRateLimitExceeded"}]}}"#;
        let err = error_from_response(StatusCode::FORBIDDEN, body);
        assert_eq!(err.status, Some(429));
        assert!(err.is_rate_limited());
    }

    #[test]
    fn daily_limit_becomes_quota() {
        let body = r#"{"error": {"code": 403, "message": "Daily Limit Exceeded",
            "errors": [{"reason": "dailyLimitExceeded"}]}}"#;
        let err = error_from_response(StatusCode::FORBIDDEN, body);
        assert_eq!(err.kind, ErrorKind::Quota);
        assert_eq!(err.status, None);
    }

    #[test]
    fn non_json_body_falls_back_to_status() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, "<html>502</html>");
        assert_eq!(err.status, Some(502));
        assert!(err.message.contains("502"));
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = GoogleClient::new(AccessToken::new("  ")).err().unwrap();
        assert_eq!(err.status, Some(401));
    }

    #[test]
    fn extract_array_missing_field_is_empty() {
        let value = serde_json::json!({"files": [{"id": "a"}]});
        assert_eq!(extract_array(&value, "files").len(), 1);
        assert!(extract_array(&value, "messages").is_empty());
    }
}
