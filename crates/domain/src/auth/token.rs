//! `OAuth2` tokens obtained by the implicit and authorization-code grants.

use serde::{Deserialize, Serialize};

/// Token delivered in the redirect fragment of the implicit grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ImplicitToken {
    /// The access token string.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds, as reported by the server.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// The `state` echoed back by the server.
    #[serde(default)]
    pub state: Option<String>,
    /// Scopes granted by this token.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Token returned by the token endpoint of the authorization-code grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthCodeToken {
    /// The access token string.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds, as reported by the server.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Refresh token, when the server issued one. Never used by the providers.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Scopes granted by this token.
    #[serde(default)]
    pub scope: Option<String>,
}

impl AuthCodeToken {
    /// Returns the `Authorization` header value for the given prefix.
    #[must_use]
    pub fn authorization_header(&self, prefix: &str) -> String {
        format!("{prefix} {}", self.access_token)
    }
}

/// Either kind of token, as published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "grant", rename_all = "snake_case")]
pub enum IssuedToken {
    /// Obtained through the implicit grant.
    Implicit(ImplicitToken),
    /// Obtained by exchanging an authorization code.
    AuthorizationCode(AuthCodeToken),
}

impl IssuedToken {
    /// The access token string.
    #[must_use]
    pub fn access_token(&self) -> &str {
        match self {
            Self::Implicit(token) => &token.access_token,
            Self::AuthorizationCode(token) => &token.access_token,
        }
    }

    /// Lifetime in seconds, if the server reported one.
    #[must_use]
    pub const fn expires_in(&self) -> Option<i64> {
        match self {
            Self::Implicit(token) => token.expires_in,
            Self::AuthorizationCode(token) => token.expires_in,
        }
    }
}
