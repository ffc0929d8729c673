//! Network ports used by the Digest and authorization-code providers.

use async_trait::async_trait;
use warden_domain::{AuthCodeToken, AuthResult};

/// Port for fetching a Digest challenge.
#[async_trait]
pub trait ChallengeFetcher: Send + Sync {
    /// Sends one unauthenticated request and returns its `WWW-Authenticate`
    /// header, if any. Status and body are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`warden_domain::AuthError::Network`] on transport failure.
    async fn fetch_challenge(&self, method: &str, url: &str) -> AuthResult<Option<String>>;
}

/// Authorization-code exchange request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// Token endpoint.
    pub token_url: String,
    /// Client identifier.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Grant code captured from the redirect.
    pub code: String,
    /// Redirect URI used for the authorization request.
    pub redirect_uri: String,
}

impl TokenRequest {
    /// Form parameters of the exchange, in wire order.
    #[must_use]
    pub fn form_params(&self) -> [(&'static str, &str); 5] {
        [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", self.code.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ]
    }
}

/// Port for exchanging an authorization code for a token.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Posts the exchange request and parses the JSON token response.
    ///
    /// # Errors
    ///
    /// Returns [`warden_domain::AuthError::Network`] on transport failure and
    /// [`warden_domain::AuthError::AuthorizationFailed`] when the server
    /// rejects the grant.
    async fn exchange(&self, request: &TokenRequest) -> AuthResult<AuthCodeToken>;
}
