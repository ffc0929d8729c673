//! Authentication error types

use thiserror::Error;

/// Errors raised while computing an `Authorization` header or obtaining a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Transport failure while fetching a challenge or exchanging a grant.
    #[error("network error: {message}")]
    Network {
        /// Error description.
        message: String,
    },

    /// The `WWW-Authenticate` challenge is missing or lacks `realm`/`nonce`.
    #[error("malformed digest challenge: {message}")]
    MalformedChallenge {
        /// Error description.
        message: String,
    },

    /// The captured redirect does not carry the expected fragment, query or key.
    #[error("malformed redirect: {message}")]
    MalformedRedirect {
        /// Error description.
        message: String,
    },

    /// No redirect arrived within the capture window.
    #[error("authorization capture timed out after {seconds}s")]
    CaptureTimeout {
        /// The configured window, in seconds.
        seconds: u64,
    },

    /// The user dismissed the capture or the caller cancelled it.
    #[error("authorization capture cancelled")]
    CaptureCancelled,

    /// The capture surface could not be opened (listener bind, browser launch).
    #[error("authorization capture failed: {message}")]
    CaptureFailed {
        /// Error description.
        message: String,
    },

    /// The authorization grant was already exchanged for a token.
    #[error("authorization grant has already been used")]
    GrantAlreadyUsed,

    /// The authorization server answered with an `OAuth2` error.
    #[error("authorization failed: {message}")]
    AuthorizationFailed {
        /// Error description, usually the server's `error_description`.
        message: String,
    },

    /// The `state` returned by the server does not match the one sent.
    #[error("state mismatch: expected '{expected}', got '{actual}'")]
    StateMismatch {
        /// The configured state.
        expected: String,
        /// The state found in the redirect.
        actual: String,
    },

    /// The provider configuration cannot be used.
    #[error("invalid auth configuration: {message}")]
    InvalidConfiguration {
        /// Error description.
        message: String,
    },

    /// The provider yields a token for out-of-band use, not a per-request header.
    #[error("this provider does not produce an Authorization header")]
    HeaderUnavailable,
}

impl AuthError {
    /// Shorthand for [`AuthError::Network`].
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Shorthand for [`AuthError::MalformedChallenge`].
    #[must_use]
    pub fn malformed_challenge(message: impl Into<String>) -> Self {
        Self::MalformedChallenge {
            message: message.into(),
        }
    }

    /// Shorthand for [`AuthError::MalformedRedirect`].
    #[must_use]
    pub fn malformed_redirect(message: impl Into<String>) -> Self {
        Self::MalformedRedirect {
            message: message.into(),
        }
    }

    /// Shorthand for [`AuthError::InvalidConfiguration`].
    #[must_use]
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Returns true for errors the user can fix by simply retrying the attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::CaptureTimeout { .. } | Self::CaptureCancelled
        )
    }
}

/// Result type alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
