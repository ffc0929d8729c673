//! Basic authentication provider.

use async_trait::async_trait;
use warden_domain::{AuthResult, BasicCredentials};

use super::AuthProvider;

/// Stateless provider for the `Basic` scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuthProvider {
    credentials: BasicCredentials,
    enabled: bool,
}

impl BasicAuthProvider {
    /// Creates a Basic provider.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>, enabled: bool) -> Self {
        Self::from_credentials(BasicCredentials::new(username, password), enabled)
    }

    /// Creates a Basic provider from existing credentials.
    #[must_use]
    pub const fn from_credentials(credentials: BasicCredentials, enabled: bool) -> Self {
        Self {
            credentials,
            enabled,
        }
    }

    /// The header value. Pure and infallible.
    #[must_use]
    pub fn header(&self) -> String {
        self.credentials.authorization_header()
    }
}

#[async_trait]
impl AuthProvider for BasicAuthProvider {
    fn is_enabled(&mut self) -> bool {
        self.enabled
    }

    async fn auth_header(&mut self) -> AuthResult<String> {
        Ok(self.header())
    }
}
