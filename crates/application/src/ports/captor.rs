//! Authorization-grant captor port.
//!
//! A captor shows the authorization page to the user and returns the URL the
//! authorization server redirected to once the user is done.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use warden_domain::{AuthError, AuthResult, CaptureMethod};

use super::CancellationReceiver;

/// Port for capturing the authorization redirect.
#[async_trait]
pub trait AuthorizationGrantCaptor: Send + Sync {
    /// Opens `authorize_url` and waits for the redirect to `capture_key`.
    ///
    /// `capture_key` is the redirect URI sent to the authorization server.
    /// Implementations must release whatever they opened on every exit path.
    ///
    /// # Errors
    ///
    /// - [`AuthError::CaptureTimeout`] if no redirect arrives in time.
    /// - [`AuthError::CaptureCancelled`] if `cancel` fires or the user closes the surface.
    /// - [`AuthError::CaptureFailed`] if the capture surface cannot be opened.
    async fn capture(
        &self,
        authorize_url: &str,
        capture_key: &str,
        cancel: CancellationReceiver,
    ) -> AuthResult<String>;

    /// Whether results delivered in the URL fragment reach this captor.
    fn sees_fragments(&self) -> bool;
}

/// The two captors, selected by [`CaptureMethod`].
#[derive(Clone)]
pub struct CaptorSet {
    browser: Arc<dyn AuthorizationGrantCaptor>,
    web_view: Arc<dyn AuthorizationGrantCaptor>,
}

impl CaptorSet {
    /// Creates a captor set.
    #[must_use]
    pub fn new(
        browser: Arc<dyn AuthorizationGrantCaptor>,
        web_view: Arc<dyn AuthorizationGrantCaptor>,
    ) -> Self {
        Self { browser, web_view }
    }

    /// Returns the captor for `method`.
    #[must_use]
    pub fn select(&self, method: CaptureMethod) -> Arc<dyn AuthorizationGrantCaptor> {
        match method {
            CaptureMethod::Browser => Arc::clone(&self.browser),
            CaptureMethod::WebView => Arc::clone(&self.web_view),
        }
    }
}

impl std::fmt::Debug for CaptorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptorSet").finish_non_exhaustive()
    }
}

/// Runs a redirect wait under the shared timeout/cancel contract.
///
/// Cancellation wins over a redirect that becomes ready at the same time.
///
/// # Errors
///
/// Returns [`AuthError::CaptureCancelled`] when `cancel` fires,
/// [`AuthError::CaptureTimeout`] when `timeout` elapses, or the error of `wait`.
pub async fn bounded_capture<F>(
    wait: F,
    timeout: Duration,
    mut cancel: CancellationReceiver,
) -> AuthResult<String>
where
    F: Future<Output = AuthResult<String>> + Send,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AuthError::CaptureCancelled),
        result = tokio::time::timeout(timeout, wait) => match result {
            Ok(redirect) => redirect,
            Err(_) => Err(AuthError::CaptureTimeout {
                seconds: timeout.as_secs(),
            }),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::CancellationToken;

    #[tokio::test]
    async fn test_bounded_capture_returns_redirect() {
        let result = bounded_capture(
            async { Ok("http://127.0.0.1/cb?code=1".to_string()) },
            Duration::from_secs(1),
            CancellationReceiver::never(),
        )
        .await;
        assert_eq!(result.unwrap(), "http://127.0.0.1/cb?code=1");
    }

    #[tokio::test]
    async fn test_bounded_capture_times_out() {
        let result = bounded_capture(
            std::future::pending(),
            Duration::from_millis(20),
            CancellationReceiver::never(),
        )
        .await;
        assert_eq!(result, Err(AuthError::CaptureTimeout { seconds: 0 }));
    }

    #[tokio::test]
    async fn test_bounded_capture_cancelled() {
        let (token, receiver) = CancellationToken::new();
        token.cancel();
        let result =
            bounded_capture(std::future::pending(), Duration::from_secs(5), receiver).await;
        assert_eq!(result, Err(AuthError::CaptureCancelled));
    }
}
