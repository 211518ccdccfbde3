//! Google OAuth2 Provider
//!
//! Authorization Code flow with PKCE against Google's endpoints.

use std::collections::HashMap;
use tracing::{error, info};

use super::{OAuthProvider, OAuthTokens};
use crate::auth::AccessToken;
use crate::common::{create_http_client, ApiError, ApiResult};

// ── Google OAuth endpoints ──────────────────────────────────────────────────

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Google OAuth2 provider.
pub struct GoogleProvider {
    pub client_id: String,
    /// Only "Desktop app" clients need a secret for the code exchange
    pub client_secret: Option<String>,
}

impl GoogleProvider {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
        }
    }

    pub fn with_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }
}

impl OAuthProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorize_url(
        &self,
        scopes: &[String],
        state: &str,
        code_challenge: &str,
        redirect_uri: &str,
    ) -> String {
        let scope_str = scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256&include_granted_scopes=true",
            AUTH_ENDPOINT,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope_str),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge),
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> ApiResult<OAuthTokens> {
        info!("Exchanging authorization code for tokens");

        let mut params = HashMap::new();
        params.insert("client_id", self.client_id.as_str());
        if let Some(secret) = self.client_secret.as_deref() {
            params.insert("client_secret", secret);
        }
        params.insert("code", code);
        params.insert("code_verifier", code_verifier);
        params.insert("grant_type", "authorization_code");
        params.insert("redirect_uri", redirect_uri);

        let response = post_form(TOKEN_ENDPOINT, &params).await?;
        parse_token_response(&response)
    }

    fn default_scopes(&self) -> Vec<String> {
        vec![
            "https://www.googleapis.com/auth/drive".to_string(),
            "https://mail.google.com/".to_string(),
            "openid".to_string(),
            "email".to_string(),
        ]
    }
}

// ── HTTP utilities ──────────────────────────────────────────────────────────

/// POST a form-encoded request and return the response body.
async fn post_form(url: &str, params: &HashMap<&str, &str>) -> ApiResult<String> {
    let client = create_http_client()?;

    let response = client.post(url).form(params).send().await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        error!("Token endpoint returned HTTP {}", status);
        return Err(ApiError::http(
            status.as_u16(),
            format!("Token endpoint error: {}", body),
        ));
    }

    Ok(body)
}

/// Parse a Google OAuth2 token response.
fn parse_token_response(body: &str) -> ApiResult<OAuthTokens> {
    let parsed: serde_json::Value = serde_json::from_str(body)?;

    if let Some(err) = parsed.get("error").and_then(|v| v.as_str()) {
        let desc = parsed
            .get("error_description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error");
        return Err(ApiError::http(400, format!("{}: {}", err, desc)));
    }

    let access_token = parsed
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::decode("Missing access_token in response"))?;

    let refresh_token = parsed
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .map(AccessToken::new);

    let token_type = parsed
        .get("token_type")
        .and_then(|v| v.as_str())
        .unwrap_or("Bearer")
        .to_string();

    let expires_in = parsed
        .get("expires_in")
        .and_then(|v| v.as_u64())
        .unwrap_or(3600);

    let expiry = (chrono::Utc::now() + chrono::Duration::seconds(expires_in as i64)).to_rfc3339();

    let scopes = parsed
        .get("scope")
        .and_then(|v| v.as_str())
        .map(|s| s.split(' ').map(String::from).collect())
        .unwrap_or_default();

    Ok(OAuthTokens {
        access_token: AccessToken::new(access_token),
        refresh_token,
        token_type,
        expiry,
        scopes,
    })
}

// ── PKCE Utilities ──────────────────────────────────────────────────────────

/// Generate a PKCE code verifier (43-128 characters of unreserved URI characters).
pub fn generate_code_verifier() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64_url_encode(&bytes)
}

/// Derive the PKCE code challenge from a code verifier using S256.
pub fn generate_code_challenge(verifier: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(verifier.as_bytes());
    base64_url_encode(&hash)
}

/// Base64url encoding (no padding) per RFC 4648 §5.
fn base64_url_encode(data: &[u8]) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    URL_SAFE_NO_PAD.encode(data)
}
