//! Events emitted during `OAuth2` flows.
//!
//! Observers subscribe to a provider and receive these over a channel, which
//! decouples the providers from any particular UI.

use chrono::{DateTime, Utc};
use warden_domain::{AuthError, CaptureMethod, IssuedToken};

use crate::ports::CancellationToken;

/// Events emitted during `OAuth2` flows for UI updates.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// The captor was started and waits for the user.
    AwaitingAuthorization {
        /// The authorization URL shown to the user.
        authorize_url: String,
        /// Which captor is waiting.
        capture_method: CaptureMethod,
        /// Cancels the wait, e.g. when the user dismisses the prompt.
        cancel: CancellationToken,
    },
    /// The authorization server redirected back.
    RedirectCaptured,
    /// The grant code is being exchanged.
    ExchangingGrant,
    /// A token was obtained.
    TokenIssued {
        /// The token.
        token: IssuedToken,
        /// When the token was obtained.
        obtained_at: DateTime<Utc>,
        /// When the token expires, if the server said.
        expires_at: Option<DateTime<Utc>>,
    },
    /// The flow failed.
    Failed {
        /// The error.
        error: AuthError,
    },
    /// The user or caller cancelled the capture.
    Cancelled,
}

impl AuthEvent {
    /// Builds a [`AuthEvent::TokenIssued`] stamped with `obtained_at`.
    #[must_use]
    pub fn token_issued(token: IssuedToken, obtained_at: DateTime<Utc>) -> Self {
        let expires_at = token
            .expires_in()
            .and_then(chrono::TimeDelta::try_seconds)
            .and_then(|lifetime| obtained_at.checked_add_signed(lifetime));
        Self::TokenIssued {
            token,
            obtained_at,
            expires_at,
        }
    }

    /// Get a preview of an access token (first 8 chars + ...).
    #[must_use]
    pub fn token_preview(token: &str) -> String {
        if token.chars().count() > 12 {
            let head: String = token.chars().take(8).collect();
            format!("{head}...")
        } else {
            token.to_string()
        }
    }
}
