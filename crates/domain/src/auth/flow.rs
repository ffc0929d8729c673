//! `OAuth2` flow state.
//!
//! A flow state is an immutable snapshot: every transition returns a new
//! value, so comparing two snapshots tells whether the configuration changed.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::{AuthCodeToken, ImplicitToken};
use crate::{AuthError, AuthResult};

/// Header prefix used when none is configured.
pub const DEFAULT_HEADER_PREFIX: &str = "Bearer";

/// How the authorization server's redirect is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMethod {
    /// System browser plus a loopback listener. Query-delivered results only.
    #[default]
    Browser,
    /// Embedded browsing surface observed in-process.
    WebView,
}

/// State shared by both grants plus the grant-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2FlowState {
    /// Client identifier registered with the authorization server.
    pub client_id: String,
    /// Whether the provider is active.
    #[serde(default)]
    pub enabled: bool,
    /// Space-separated scopes; blank means none requested.
    #[serde(default)]
    pub scope: String,
    /// Prefix of the `Authorization` header; blank means `Bearer`.
    #[serde(default)]
    pub header_prefix: String,
    /// Grant-specific state.
    pub grant: FlowGrant,
}

/// Grant-specific part of an [`OAuth2FlowState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum FlowGrant {
    /// Implicit grant: the token arrives in the redirect fragment.
    Implicit(ImplicitGrant),
    /// Authorization-code grant: a one-time code is exchanged for a token.
    AuthorizationCode(AuthorizationCodeGrant),
}

/// Implicit grant state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ImplicitGrant {
    /// Capture strategy.
    #[serde(default)]
    pub capture_method: CaptureMethod,
    /// Authorization endpoint.
    pub auth_url: String,
    /// Redirect URI registered for the client.
    #[serde(default)]
    pub redirect_url: String,
    /// CSRF nonce sent as `state`.
    #[serde(default)]
    pub state: String,
    /// Token obtained by the last successful flow.
    #[serde(default)]
    pub access_token: Option<ImplicitToken>,
}

/// Authorization-code grant state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthorizationCodeGrant {
    /// Capture strategy.
    #[serde(default)]
    pub capture_method: CaptureMethod,
    /// Authorization endpoint.
    pub auth_url: String,
    /// Token endpoint.
    pub access_token_url: String,
    /// Redirect URI registered for the client.
    #[serde(default)]
    pub redirect_url: String,
    /// Client secret sent with the exchange.
    #[serde(default)]
    pub client_secret: String,
    /// CSRF nonce sent as `state`.
    #[serde(default)]
    pub state: String,
    /// Captured grant code.
    #[serde(default)]
    pub auth_grant: Option<String>,
    /// Whether `auth_grant` has been exchanged successfully.
    #[serde(default)]
    pub auth_grant_used: bool,
    /// Token obtained by the last successful exchange.
    #[serde(default)]
    pub access_token: Option<AuthCodeToken>,
}

impl FlowGrant {
    /// The `response_type` requested from the authorization endpoint.
    #[must_use]
    pub const fn response_type(&self) -> &'static str {
        match self {
            Self::Implicit(_) => "token",
            Self::AuthorizationCode(_) => "code",
        }
    }

    /// Configured capture strategy.
    #[must_use]
    pub const fn capture_method(&self) -> CaptureMethod {
        match self {
            Self::Implicit(grant) => grant.capture_method,
            Self::AuthorizationCode(grant) => grant.capture_method,
        }
    }

    /// Authorization endpoint.
    #[must_use]
    pub fn auth_url(&self) -> &str {
        match self {
            Self::Implicit(grant) => &grant.auth_url,
            Self::AuthorizationCode(grant) => &grant.auth_url,
        }
    }

    /// Redirect URI.
    #[must_use]
    pub fn redirect_url(&self) -> &str {
        match self {
            Self::Implicit(grant) => &grant.redirect_url,
            Self::AuthorizationCode(grant) => &grant.redirect_url,
        }
    }

    /// Configured `state`.
    #[must_use]
    pub fn state(&self) -> &str {
        match self {
            Self::Implicit(grant) => &grant.state,
            Self::AuthorizationCode(grant) => &grant.state,
        }
    }

    fn set_redirect_url(&mut self, redirect_url: String) {
        match self {
            Self::Implicit(grant) => grant.redirect_url = redirect_url,
            Self::AuthorizationCode(grant) => grant.redirect_url = redirect_url,
        }
    }
}

impl OAuth2FlowState {
    /// Creates an enabled implicit-grant state.
    #[must_use]
    pub fn implicit(client_id: impl Into<String>, grant: ImplicitGrant) -> Self {
        Self {
            client_id: client_id.into(),
            enabled: true,
            scope: String::new(),
            header_prefix: String::new(),
            grant: FlowGrant::Implicit(grant),
        }
    }

    /// Creates an enabled authorization-code state.
    #[must_use]
    pub fn authorization_code(
        client_id: impl Into<String>,
        grant: AuthorizationCodeGrant,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            enabled: true,
            scope: String::new(),
            header_prefix: String::new(),
            grant: FlowGrant::AuthorizationCode(grant),
        }
    }

    /// Sets the requested scopes.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The header prefix, falling back to `Bearer` when blank.
    #[must_use]
    pub fn header_prefix(&self) -> &str {
        non_blank(&self.header_prefix).unwrap_or(DEFAULT_HEADER_PREFIX)
    }

    /// Derives the working state from a configuration snapshot.
    ///
    /// The redirect URL is forced to `local_redirect` when it is blank or
    /// when the browser captor is used, since the loopback listener is the
    /// only place a browser redirect can land. A blank header prefix becomes
    /// `Bearer`.
    #[must_use]
    pub fn derive(&self, local_redirect: &str) -> Self {
        let mut derived = self.clone();
        if derived.grant.redirect_url().trim().is_empty()
            || derived.grant.capture_method() == CaptureMethod::Browser
        {
            derived.grant.set_redirect_url(local_redirect.to_string());
        }
        derived.header_prefix = self.header_prefix().to_string();
        derived
    }

    /// Builds the authorization endpoint URL for this grant.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if the authorization URL
    /// or client id is blank.
    pub fn authorize_url(&self) -> AuthResult<String> {
        let auth_url = self.grant.auth_url().trim();
        if auth_url.is_empty() {
            return Err(AuthError::invalid_configuration("authorization URL is empty"));
        }
        if self.client_id.trim().is_empty() {
            return Err(AuthError::invalid_configuration("client id is empty"));
        }

        let separator = if auth_url.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{auth_url}{separator}response_type={}&client_id={}&redirect_uri={}",
            self.grant.response_type(),
            encode(&self.client_id),
            encode(self.grant.redirect_url()),
        );
        if let Some(scope) = non_blank(&self.scope) {
            url.push_str("&scope=");
            url.push_str(&encode(scope));
        }
        if let Some(state) = non_blank(self.grant.state()) {
            url.push_str("&state=");
            url.push_str(&encode(state));
        }
        Ok(url)
    }

    /// Returns a new snapshot holding `token`. No-op for the code grant.
    #[must_use]
    pub fn with_implicit_token(&self, token: ImplicitToken) -> Self {
        let mut next = self.clone();
        if let FlowGrant::Implicit(grant) = &mut next.grant {
            grant.access_token = Some(token);
        }
        next
    }

    /// Returns a new snapshot holding a freshly captured, unused grant code.
    #[must_use]
    pub fn with_auth_grant(&self, code: impl Into<String>) -> Self {
        let mut next = self.clone();
        if let FlowGrant::AuthorizationCode(grant) = &mut next.grant {
            grant.auth_grant = Some(code.into());
            grant.auth_grant_used = false;
            grant.access_token = None;
        }
        next
    }

    /// Returns a new snapshot with the grant marked used and `token` held.
    #[must_use]
    pub fn with_exchanged_grant(&self, token: AuthCodeToken) -> Self {
        let mut next = self.clone();
        if let FlowGrant::AuthorizationCode(grant) = &mut next.grant {
            grant.auth_grant_used = true;
            grant.access_token = Some(token);
        }
        next
    }

    /// The `Authorization` header for the held token, if any.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        let access_token = match &self.grant {
            FlowGrant::Implicit(grant) => grant.access_token.as_ref().map(|t| &t.access_token),
            FlowGrant::AuthorizationCode(grant) => {
                grant.access_token.as_ref().map(|t| &t.access_token)
            }
        }?;
        Some(format!("{} {access_token}", self.header_prefix()))
    }
}

/// Returns the trimmed value unless it is blank.
#[must_use]
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
