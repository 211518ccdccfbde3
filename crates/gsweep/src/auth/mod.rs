//! Sign-in support
//!
//! Covers CSRF state for the redirect, PKCE, the code exchange with Google,
//! and keeping tokens out of logs. Token persistence is left to the caller.

pub mod provider;
pub mod session;
pub mod state;

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use provider::google::GoogleProvider;
pub use provider::{OAuthProvider, OAuthTokens};
pub use session::{MemorySessionStore, SessionStore};
pub use state::{generate_state_token, AuthorizationCode, AuthorizationRequest, StateGuard};

/// OAuth bearer token. Wiped from memory on drop, redacted in `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}
