//! Digest authentication provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use warden_domain::auth::request_path;
use warden_domain::{AuthError, AuthResult, DigestChallenge, DigestCredentials};

use super::AuthProvider;
use crate::ports::ChallengeFetcher;

/// Provider for the `Digest` scheme.
///
/// Every header computation fetches a fresh challenge, so each header is
/// bound to the nonce the server handed out for it.
pub struct DigestAuthProvider {
    credentials: DigestCredentials,
    method: String,
    url: String,
    enabled: bool,
    fetcher: Arc<dyn ChallengeFetcher>,
}

impl DigestAuthProvider {
    /// Creates a Digest provider for a request to `url` with `method`.
    #[must_use]
    pub fn new(
        credentials: DigestCredentials,
        method: impl Into<String>,
        url: impl Into<String>,
        enabled: bool,
        fetcher: Arc<dyn ChallengeFetcher>,
    ) -> Self {
        Self {
            credentials,
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
            enabled,
            fetcher,
        }
    }
}

impl std::fmt::Debug for DigestAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestAuthProvider")
            .field("username", &self.credentials.username)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for DigestAuthProvider {
    fn is_enabled(&mut self) -> bool {
        self.enabled
    }

    async fn auth_header(&mut self) -> AuthResult<String> {
        let path = request_path(&self.url)?;

        debug!(url = %self.url, method = %self.method, "Fetching digest challenge");
        let header = self
            .fetcher
            .fetch_challenge(&self.method, &self.url)
            .await?
            .ok_or_else(|| {
                AuthError::malformed_challenge("server did not send a WWW-Authenticate header")
            })?;

        let challenge = DigestChallenge::parse(&header)?;
        debug!(realm = %challenge.realm, "Computing digest response");
        Ok(challenge.authorization_header(&self.credentials, &self.method, &path))
    }
}
