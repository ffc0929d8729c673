//! Authentication settings.
//!
//! Timeouts and the loopback redirect endpoint used by the providers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default loopback address of the redirect listener.
pub const DEFAULT_REDIRECT_BIND_ADDRESS: &str = "127.0.0.1:8080";

/// Default path of the redirect listener.
pub const DEFAULT_REDIRECT_PATH: &str = "/callback";

/// User-tunable authentication settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// TCP connect timeout for challenge fetches and token exchanges.
    pub connect_timeout_ms: u64,
    /// Whole-request timeout for challenge fetches and token exchanges.
    pub request_timeout_ms: u64,
    /// How long a captor waits for the authorization redirect.
    pub capture_timeout_secs: u64,
    /// Loopback `host:port` the browser redirect listener binds to.
    pub redirect_bind_address: String,
    /// Path of the browser redirect listener.
    pub redirect_path: String,
    /// User-Agent sent with challenge fetches and token exchanges.
    pub user_agent: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            capture_timeout_secs: 300,
            redirect_bind_address: DEFAULT_REDIRECT_BIND_ADDRESS.to_string(),
            redirect_path: DEFAULT_REDIRECT_PATH.to_string(),
            user_agent: format!("Warden/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl AuthSettings {
    /// The redirect URI served by the loopback listener.
    ///
    /// This must match what is registered with the authorization server.
    #[must_use]
    pub fn local_redirect_url(&self) -> String {
        let path = if self.redirect_path.starts_with('/') {
            self.redirect_path.clone()
        } else {
            format!("/{}", self.redirect_path)
        };
        format!("http://{}{path}", self.redirect_bind_address)
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Capture window as a [`Duration`].
    #[must_use]
    pub const fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }
}
