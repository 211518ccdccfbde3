//! OAuth Provider Abstraction
//!
//! Authorization URL construction and code exchange. Token refresh and
//! revocation belong to whoever hosts the sign-in flow, not to this crate.

pub mod google;

use serde::{Deserialize, Serialize};

use super::AccessToken;
use crate::common::ApiResult;

/// Tokens returned from an OAuth code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: Option<AccessToken>,
    pub token_type: String,
    pub expiry: String,
    pub scopes: Vec<String>,
}

/// OAuth provider trait.
#[allow(async_fn_in_trait)]
pub trait OAuthProvider {
    /// Provider name (e.g. "google")
    fn name(&self) -> &str;

    /// Build the authorization URL. `state` must be echoed back verbatim by
    /// the provider on the redirect.
    fn authorize_url(
        &self,
        scopes: &[String],
        state: &str,
        code_challenge: &str,
        redirect_uri: &str,
    ) -> String;

    /// Exchange an authorization code for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> ApiResult<OAuthTokens>;

    /// Default scopes for this provider.
    fn default_scopes(&self) -> Vec<String>;
}
