//! `OAuth2` implicit grant.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;
use warden_domain::auth::{parse_implicit_redirect, verify_state};
use warden_domain::{AuthError, AuthResult, FlowGrant, ImplicitToken, IssuedToken};

use super::{FlowSession, OAuth2Dependencies};
use crate::auth::{AuthEvent, AuthProvider};
use crate::ports::FlowStateSource;

/// Provider for the implicit grant.
///
/// The grant yields a token for out-of-band reuse: [`access_token`] runs the
/// flow and the token is also published as [`AuthEvent::TokenIssued`].
/// [`AuthProvider::auth_header`] always fails with
/// [`AuthError::HeaderUnavailable`].
///
/// [`access_token`]: ImplicitProvider::access_token
pub struct ImplicitProvider {
    session: FlowSession,
}

impl ImplicitProvider {
    /// Creates a provider reading its configuration from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn FlowStateSource>, deps: OAuth2Dependencies) -> Self {
        Self {
            session: FlowSession::new(source, deps),
        }
    }

    /// Returns a receiver for this provider's events, replacing any previous one.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AuthEvent> {
        self.session.subscribe()
    }

    /// The token held for the current configuration, if any.
    #[must_use]
    pub fn token(&self) -> Option<&ImplicitToken> {
        match &self.session.state().grant {
            FlowGrant::Implicit(grant) => grant.access_token.as_ref(),
            FlowGrant::AuthorizationCode(_) => None,
        }
    }

    /// Returns the held token, running the implicit flow if there is none.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidConfiguration`] if the configuration is not an implicit grant.
    /// - Capture errors from the captor.
    /// - [`AuthError::MalformedRedirect`] if the redirect has no usable fragment.
    /// - [`AuthError::StateMismatch`] if the echoed `state` differs.
    pub async fn access_token(&mut self) -> AuthResult<ImplicitToken> {
        self.session.refresh();
        let FlowGrant::Implicit(grant) = &self.session.state().grant else {
            return Err(AuthError::invalid_configuration(
                "implicit provider configured with a non-implicit grant",
            ));
        };
        if let Some(token) = &grant.access_token {
            return Ok(token.clone());
        }
        let expected_state = grant.state.clone();

        let redirected = self.session.capture_redirect().await?;
        let token = parse_implicit_redirect(&redirected)
            .and_then(|token| verify_state(&expected_state, token.state.as_deref()).map(|()| token))
            .inspect_err(|error| self.session.emit_failure(error))?;

        info!(
            token = %AuthEvent::token_preview(&token.access_token),
            expires_in = ?token.expires_in,
            "Implicit grant token obtained"
        );
        let next = self.session.state().with_implicit_token(token.clone());
        self.session.replace_state(next);
        self.session.emit_token(IssuedToken::Implicit(token.clone()));
        Ok(token)
    }
}

#[async_trait]
impl AuthProvider for ImplicitProvider {
    fn is_enabled(&mut self) -> bool {
        self.session.refresh();
        self.session.state().enabled
    }

    async fn auth_header(&mut self) -> AuthResult<String> {
        Err(AuthError::HeaderUnavailable)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::watch;
    use warden_domain::{CaptureMethod, ImplicitGrant, OAuth2FlowState};

    use super::*;
    use crate::auth::oauth2::test_support::{LOCAL_REDIRECT, ScriptedCaptor, dependencies};

    const REDIRECT: &str = "https://app/cb#access_token=abc&token_type=Bearer&expires_in=3600&state=xyz";

    fn config(state: &str) -> OAuth2FlowState {
        OAuth2FlowState::implicit(
            "client-1",
            ImplicitGrant {
                capture_method: CaptureMethod::WebView,
                auth_url: "https://auth.example.com/authorize".to_string(),
                redirect_url: "https://app/cb".to_string(),
                state: state.to_string(),
                access_token: None,
            },
        )
    }

    fn provider_with(
        source: Arc<dyn FlowStateSource>,
        web_view: Arc<ScriptedCaptor>,
    ) -> ImplicitProvider {
        ImplicitProvider::new(
            source,
            dependencies(ScriptedCaptor::new(vec![], false), web_view),
        )
    }

    #[tokio::test]
    async fn test_access_token_from_fragment() {
        let web_view = ScriptedCaptor::new(vec![Some(Ok(REDIRECT.to_string()))], true);
        let mut provider = provider_with(Arc::new(config("xyz")), Arc::clone(&web_view));
        let mut events = provider.subscribe();

        let token = provider.access_token().await.unwrap();
        assert_eq!(
            token,
            ImplicitToken {
                access_token: "abc".to_string(),
                token_type: Some("Bearer".to_string()),
                expires_in: Some(3600),
                state: Some("xyz".to_string()),
                scope: None,
            }
        );
        assert_eq!(provider.token(), Some(&token));

        let calls = web_view.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(
                "https://auth.example.com/authorize?response_type=token&client_id=client-1&redirect_uri=https%3A%2F%2Fapp%2Fcb&state=xyz".to_string(),
                "https://app/cb".to_string()
            )]
        );

        assert!(matches!(
            events.recv().await,
            Some(AuthEvent::AwaitingAuthorization { .. })
        ));
        assert!(matches!(events.recv().await, Some(AuthEvent::RedirectCaptured)));
        let Some(AuthEvent::TokenIssued { token: issued, .. }) = events.recv().await else {
            panic!("Expected TokenIssued event");
        };
        assert_eq!(issued, IssuedToken::Implicit(token));
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let web_view = ScriptedCaptor::new(vec![Some(Ok(REDIRECT.to_string()))], true);
        let mut provider = provider_with(Arc::new(config("xyz")), Arc::clone(&web_view));

        provider.access_token().await.unwrap();
        provider.access_token().await.unwrap();
        assert_eq!(web_view.call_count(), 1);
    }

    #[tokio::test]
    async fn test_redirect_without_fragment_fails() {
        let web_view = ScriptedCaptor::new(
            vec![Some(Ok("https://app/cb?access_token=abc".to_string()))],
            true,
        );
        let mut provider = provider_with(Arc::new(config("")), web_view);
        let mut events = provider.subscribe();

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedRedirect { .. }));
        assert!(provider.token().is_none());

        events.recv().await;
        events.recv().await;
        assert!(matches!(events.recv().await, Some(AuthEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn test_malformed_expires_in_fails() {
        let web_view = ScriptedCaptor::new(
            vec![Some(Ok("https://app/cb#access_token=abc&expires_in=later".to_string()))],
            true,
        );
        let mut provider = provider_with(Arc::new(config("")), web_view);
        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedRedirect { .. }));
    }

    #[tokio::test]
    async fn test_state_mismatch() {
        let web_view = ScriptedCaptor::new(vec![Some(Ok(REDIRECT.to_string()))], true);
        let mut provider = provider_with(Arc::new(config("other")), web_view);
        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::StateMismatch { .. }));
    }

    #[tokio::test]
    async fn test_cancel_from_event() {
        let web_view = ScriptedCaptor::new(vec![None], true);
        let mut provider = provider_with(Arc::new(config("")), web_view);
        let mut events = provider.subscribe();

        let canceller = tokio::spawn(async move {
            let Some(AuthEvent::AwaitingAuthorization { cancel, .. }) = events.recv().await else {
                panic!("Expected AwaitingAuthorization event");
            };
            cancel.cancel();
            events.recv().await
        });

        let err = provider.access_token().await.unwrap_err();
        assert_eq!(err, AuthError::CaptureCancelled);
        assert!(matches!(canceller.await.unwrap(), Some(AuthEvent::Cancelled)));
    }

    #[tokio::test]
    async fn test_capture_timeout() {
        let web_view = ScriptedCaptor::new(vec![None], true);
        let mut provider = provider_with(Arc::new(config("")), web_view);
        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::CaptureTimeout { .. }));
    }

    #[tokio::test]
    async fn test_header_is_unavailable() {
        let web_view = ScriptedCaptor::new(vec![], true);
        let mut provider = provider_with(Arc::new(config("")), Arc::clone(&web_view));
        assert_eq!(
            provider.auth_header().await,
            Err(AuthError::HeaderUnavailable)
        );
        assert_eq!(web_view.call_count(), 0);
    }

    #[tokio::test]
    async fn test_is_enabled_tracks_configuration() {
        let (tx, rx) = watch::channel(config(""));
        let mut provider = provider_with(Arc::new(rx), ScriptedCaptor::new(vec![], true));
        assert!(provider.is_enabled());

        tx.send_replace(config("").with_enabled(false));
        assert!(!provider.is_enabled());

        tx.send_replace(config(""));
        assert!(provider.is_enabled());
    }

    #[tokio::test]
    async fn test_configuration_change_drops_token() {
        let (tx, rx) = watch::channel(config(""));
        let web_view = ScriptedCaptor::new(
            vec![
                Some(Ok("https://app/cb#access_token=first".to_string())),
                Some(Ok("https://app/cb#access_token=second".to_string())),
            ],
            true,
        );
        let mut provider = provider_with(Arc::new(rx), Arc::clone(&web_view));

        assert_eq!(provider.access_token().await.unwrap().access_token, "first");
        tx.send_replace(config("").with_scope("read"));
        assert!(provider.is_enabled());
        assert!(provider.token().is_none());
        assert_eq!(provider.access_token().await.unwrap().access_token, "second");
        assert_eq!(web_view.call_count(), 2);
    }

    #[tokio::test]
    async fn test_browser_capture_uses_local_redirect() {
        let browser = ScriptedCaptor::new(
            vec![Some(Ok(format!("{LOCAL_REDIRECT}?code=ignored")))],
            false,
        );
        let mut state = config("");
        if let FlowGrant::Implicit(grant) = &mut state.grant {
            grant.capture_method = CaptureMethod::Browser;
        }
        let mut provider = ImplicitProvider::new(
            Arc::new(state),
            dependencies(Arc::clone(&browser), ScriptedCaptor::new(vec![], true)),
        );

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedRedirect { .. }));
        let calls = browser.calls.lock().unwrap().clone();
        assert_eq!(calls[0].1, LOCAL_REDIRECT);
    }
}
