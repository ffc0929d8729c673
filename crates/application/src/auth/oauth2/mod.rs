//! `OAuth2` providers.
//!
//! Both grants share a [`FlowSession`]: it re-derives the flow state from
//! the owner's configuration, keeps the working snapshot, drives the captor
//! and publishes [`AuthEvent`]s.

mod code;
mod implicit;

pub use code::AuthorizationCodeProvider;
pub use implicit::ImplicitProvider;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use warden_domain::{AuthError, AuthResult, IssuedToken, OAuth2FlowState};

use super::AuthEvent;
use crate::ports::{CancellationToken, CaptorSet, Clock, FlowStateSource};

/// Collaborators shared by the `OAuth2` providers.
#[derive(Clone)]
pub struct OAuth2Dependencies {
    /// Redirect captors.
    pub captors: CaptorSet,
    /// Timestamps issued tokens.
    pub clock: Arc<dyn Clock>,
    /// Redirect URI served by the browser captor.
    pub local_redirect_url: String,
}

impl std::fmt::Debug for OAuth2Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Dependencies")
            .field("local_redirect_url", &self.local_redirect_url)
            .finish_non_exhaustive()
    }
}

/// Flow-state bookkeeping shared by both grants.
pub(crate) struct FlowSession {
    source: Arc<dyn FlowStateSource>,
    deps: OAuth2Dependencies,
    /// Last configuration derived from `source`.
    configured: OAuth2FlowState,
    /// Working snapshot: `configured` plus whatever the flow obtained.
    state: OAuth2FlowState,
    events: Option<mpsc::UnboundedSender<AuthEvent>>,
}

impl FlowSession {
    pub(crate) fn new(source: Arc<dyn FlowStateSource>, deps: OAuth2Dependencies) -> Self {
        let configured = source.current().derive(&deps.local_redirect_url);
        Self {
            source,
            deps,
            state: configured.clone(),
            configured,
            events: None,
        }
    }

    /// Re-derives the configuration. When it differs from the last one the
    /// working snapshot is replaced wholesale, dropping anything cached.
    ///
    /// Returns true if the snapshot was replaced.
    pub(crate) fn refresh(&mut self) -> bool {
        let derived = self.source.current().derive(&self.deps.local_redirect_url);
        if derived == self.configured {
            return false;
        }
        debug!(client_id = %derived.client_id, "OAuth2 configuration changed, resetting flow state");
        self.configured = derived.clone();
        self.state = derived;
        true
    }

    pub(crate) const fn state(&self) -> &OAuth2FlowState {
        &self.state
    }

    pub(crate) fn replace_state(&mut self, next: OAuth2FlowState) {
        self.state = next;
    }

    pub(crate) fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AuthEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        if let Some(events) = &self.events
            && events.send(event).is_err()
        {
            debug!("Auth event receiver dropped");
        }
    }

    pub(crate) fn emit_token(&self, token: IssuedToken) {
        let obtained_at = self.deps.clock.now();
        self.emit(AuthEvent::token_issued(token, obtained_at));
    }

    /// Emits [`AuthEvent::Failed`] or [`AuthEvent::Cancelled`] for `error`.
    pub(crate) fn emit_failure(&self, error: &AuthError) {
        if matches!(error, AuthError::CaptureCancelled) {
            self.emit(AuthEvent::Cancelled);
        } else {
            warn!(error = %error, "OAuth2 flow failed");
            self.emit(AuthEvent::Failed {
                error: error.clone(),
            });
        }
    }

    /// Builds the authorize URL, runs the configured captor and returns the
    /// redirected URL.
    pub(crate) async fn capture_redirect(&self) -> AuthResult<String> {
        let authorize_url = self.state.authorize_url()?;
        let capture_method = self.state.grant.capture_method();
        let redirect_url = self.state.grant.redirect_url().to_string();
        let captor = self.deps.captors.select(capture_method);

        if self.state.grant.response_type() == "token" && !captor.sees_fragments() {
            warn!(
                ?capture_method,
                "Implicit grant delivers the token in the URL fragment, which this captor cannot see"
            );
        }

        let (cancel, cancel_rx) = CancellationToken::new();
        self.emit(AuthEvent::AwaitingAuthorization {
            authorize_url: authorize_url.clone(),
            capture_method,
            cancel,
        });
        debug!(?capture_method, redirect_url = %redirect_url, "Waiting for authorization redirect");

        let redirected = captor
            .capture(&authorize_url, &redirect_url, cancel_rx)
            .await;
        match &redirected {
            Ok(_) => self.emit(AuthEvent::RedirectCaptured),
            Err(error) => self.emit_failure(error),
        }
        redirected
    }
}
