//! Authentication configuration types

use serde::{Deserialize, Serialize};

use super::{BasicCredentials, DigestCredentials, FlowGrant, OAuth2FlowState};

/// Authentication configuration for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication
    #[default]
    None,
    /// Basic authentication
    Basic {
        /// Username and password
        #[serde(flatten)]
        credentials: BasicCredentials,
        /// Whether the provider is active
        #[serde(default = "enabled_by_default")]
        enabled: bool,
    },
    /// Digest authentication
    Digest {
        /// Username and password
        #[serde(flatten)]
        credentials: DigestCredentials,
        /// Target URL the challenge is fetched from
        url: String,
        /// HTTP method of the request being authenticated
        #[serde(default = "default_method")]
        method: String,
        /// Whether the provider is active
        #[serde(default = "enabled_by_default")]
        enabled: bool,
    },
    /// `OAuth2` implicit or authorization-code flow
    #[serde(rename = "oauth2")]
    OAuth2(OAuth2FlowState),
}

const fn enabled_by_default() -> bool {
    true
}

fn default_method() -> String {
    "GET".to_string()
}

impl AuthConfig {
    /// Returns true if authentication is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns true if this is an `OAuth2` config that needs token acquisition.
    #[must_use]
    pub const fn is_oauth2(&self) -> bool {
        matches!(self, Self::OAuth2(_))
    }

    /// Returns true for the implicit grant, which yields a token rather than a header.
    #[must_use]
    pub const fn is_implicit(&self) -> bool {
        matches!(
            self,
            Self::OAuth2(OAuth2FlowState {
                grant: FlowGrant::Implicit(_),
                ..
            })
        )
    }

    /// Creates a basic authentication.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            credentials: BasicCredentials::new(username, password),
            enabled: true,
        }
    }

    /// Creates a digest authentication for a `GET` to `url`.
    #[must_use]
    pub fn digest(
        username: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::Digest {
            credentials: DigestCredentials::new(username, password),
            url: url.into(),
            method: default_method(),
            enabled: true,
        }
    }
}
