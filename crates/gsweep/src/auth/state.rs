//! CSRF State Guard
//!
//! Every authorization request carries a fresh random `state` value that is
//! also kept in the session store. The redirect is only accepted if it echoes
//! that exact value back within ten minutes. A token verifies at most once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use tracing::{error, info, warn};

use super::provider::google::{generate_code_challenge, generate_code_verifier};
use super::provider::OAuthProvider;
use super::session::SessionStore;
use crate::common::{ApiError, ApiResult, Clock, ErrorKind, SystemClock};

const STATE_KEY: &str = "oauth_state";
const STATE_TIMESTAMP_KEY: &str = "oauth_state_timestamp";
const CODE_VERIFIER_KEY: &str = "oauth_code_verifier";

/// How long a stored state token stays valid
pub const STATE_EXPIRY: Duration = Duration::from_millis(600_000);

/// 32 random bytes from the OS, hex-encoded (64 lowercase characters).
pub fn generate_state_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// An outgoing authorization request
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// A verified authorization response
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub code: String,
    pub code_verifier: Option<String>,
}

pub struct StateGuard {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl StateGuard {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Record `token` as the pending state, replacing any earlier one.
    pub fn store_state(&self, token: &str) {
        self.store.set(STATE_KEY, token.to_string());
        self.store
            .set(STATE_TIMESTAMP_KEY, self.clock.epoch_millis().to_string());
    }

    /// Check `candidate` against the pending state.
    ///
    /// - nothing pending: `false`
    /// - pending for more than [`STATE_EXPIRY`]: cleared, `false`
    /// - different value: `false`, pending token left in place
    /// - exact match: cleared, `true`
    pub fn verify_state(&self, candidate: &str) -> bool {
        let Some(stored) = self.store.get(STATE_KEY) else {
            warn!("OAuth state verification with no pending state");
            return false;
        };

        let created = self
            .store
            .get(STATE_TIMESTAMP_KEY)
            .and_then(|ts| ts.parse::<i64>().ok());
        let elapsed = created.map(|ts| self.clock.epoch_millis() - ts);
        let expired = match elapsed {
            Some(ms) => ms < 0 || ms as u128 > STATE_EXPIRY.as_millis(),
            None => true,
        };
        if expired {
            warn!(elapsed_ms = ?elapsed, "OAuth state expired");
            self.clear();
            return false;
        }

        if !constant_time_eq(candidate.as_bytes(), stored.as_bytes()) {
            error!(
                target: "gsweep::security",
                "OAuth state mismatch; rejecting possible CSRF attempt"
            );
            return false;
        }

        self.clear();
        true
    }

    /// Start an authorization round trip: fresh state and PKCE verifier are
    /// stored, and the provider URL is returned with `state` attached.
    pub fn begin_authorization<P: OAuthProvider>(
        &self,
        provider: &P,
        scopes: &[String],
        redirect_uri: &str,
    ) -> AuthorizationRequest {
        let state = generate_state_token();
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);

        self.store_state(&state);
        self.store.set(CODE_VERIFIER_KEY, code_verifier);

        info!(provider = provider.name(), "Starting OAuth authorization");
        AuthorizationRequest {
            url: provider.authorize_url(scopes, &state, &code_challenge, redirect_uri),
            state,
        }
    }

    /// Accept the redirect query string (`code=...&state=...` or
    /// `error=...`). Any state problem aborts with a security error.
    pub fn complete_authorization(&self, query: &str) -> ApiResult<AuthorizationCode> {
        let params = parse_query_params(query.trim_start_matches('?'));

        if let Some(err) = params.get("error") {
            // the round trip is over either way
            self.clear();
            return Err(ApiError::new(
                ErrorKind::Permission,
                format!("Authorization was not granted: {}", err),
            )
            .with_status(403));
        }

        let state = params.get("state").map(String::as_str).unwrap_or_default();
        if !self.verify_state(state) {
            return Err(ApiError::security("OAuth state verification failed"));
        }

        let code = params
            .get("code")
            .filter(|c| !c.is_empty())
            .cloned()
            .ok_or_else(|| ApiError::validation("Authorization response has no code"))?;

        let code_verifier = self.store.get(CODE_VERIFIER_KEY);
        self.store.remove(CODE_VERIFIER_KEY);

        Ok(AuthorizationCode {
            code,
            code_verifier,
        })
    }

    fn clear(&self) {
        self.store.remove(STATE_KEY);
        self.store.remove(STATE_TIMESTAMP_KEY);
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Parse URL query parameters into a HashMap
pub fn parse_query_params(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|part| {
            let mut split = part.splitn(2, '=');
            match (split.next(), split.next()) {
                (Some(key), Some(value)) => {
                    let plus_decoded = value.replace('+', " ");
                    let decoded_value = urlencoding::decode(&plus_decoded).ok()?;
                    Some((key.to_string(), decoded_value.into_owned()))
                }
                _ => None,
            }
        })
        .collect()
}
