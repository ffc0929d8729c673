//! `OAuth2` authorization-code grant.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use warden_domain::auth::{parse_code_redirect, verify_state};
use warden_domain::{
    AuthCodeToken, AuthError, AuthResult, AuthorizationCodeGrant, FlowGrant, IssuedToken,
};

use super::{FlowSession, OAuth2Dependencies};
use crate::auth::{AuthEvent, AuthProvider};
use crate::ports::{FlowStateSource, TokenExchanger, TokenRequest};

/// Failed exchanges a grant survives before a fresh authorization is required.
const MAX_EXCHANGE_ATTEMPTS: u8 = 2;

/// Provider for the authorization-code grant.
///
/// The first header computation captures a grant code and exchanges it once
/// for a token; later calls reuse the token until the configuration changes.
pub struct AuthorizationCodeProvider {
    session: FlowSession,
    exchanger: Arc<dyn TokenExchanger>,
    /// Failed exchanges of the current grant.
    failed_exchanges: u8,
}

impl AuthorizationCodeProvider {
    /// Creates a provider reading its configuration from `source`.
    #[must_use]
    pub fn new(
        source: Arc<dyn FlowStateSource>,
        deps: OAuth2Dependencies,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> Self {
        Self {
            session: FlowSession::new(source, deps),
            exchanger,
            failed_exchanges: 0,
        }
    }

    /// Returns a receiver for this provider's events, replacing any previous one.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AuthEvent> {
        self.session.subscribe()
    }

    /// The token held for the current configuration, if any.
    #[must_use]
    pub fn token(&self) -> Option<&AuthCodeToken> {
        self.grant().ok().and_then(|grant| grant.access_token.as_ref())
    }

    fn grant(&self) -> AuthResult<&AuthorizationCodeGrant> {
        match &self.session.state().grant {
            FlowGrant::AuthorizationCode(grant) => Ok(grant),
            FlowGrant::Implicit(_) => Err(AuthError::invalid_configuration(
                "authorization-code provider configured with an implicit grant",
            )),
        }
    }

    /// Captures a fresh grant code and stores it, unused, in the flow state.
    ///
    /// # Errors
    ///
    /// Capture errors, [`AuthError::MalformedRedirect`] when the redirect has
    /// no code, [`AuthError::AuthorizationFailed`] when it carries an error,
    /// and [`AuthError::StateMismatch`].
    pub async fn authorize(&mut self) -> AuthResult<String> {
        self.session.refresh();
        let expected_state = self.grant()?.state.clone();

        let redirected = self.session.capture_redirect().await?;
        let redirect = parse_code_redirect(&redirected)
            .and_then(|redirect| {
                verify_state(&expected_state, redirect.state.as_deref()).map(|()| redirect)
            })
            .inspect_err(|error| self.session.emit_failure(error))?;

        debug!("Authorization grant captured");
        let next = self.session.state().with_auth_grant(redirect.code.clone());
        self.session.replace_state(next);
        self.failed_exchanges = 0;
        Ok(redirect.code)
    }

    /// Exchanges the held grant code for a token.
    ///
    /// The grant is marked used only after a successful exchange.
    ///
    /// # Errors
    ///
    /// - [`AuthError::GrantAlreadyUsed`] if the grant was already exchanged.
    /// - [`AuthError::MalformedRedirect`] if no grant has been captured.
    /// - Exchange errors from the token endpoint.
    pub async fn exchange_grant(&mut self) -> AuthResult<AuthCodeToken> {
        let grant = self.grant()?;
        if grant.auth_grant_used {
            return Err(AuthError::GrantAlreadyUsed);
        }
        let Some(code) = grant.auth_grant.clone() else {
            return Err(AuthError::malformed_redirect("no authorization grant captured"));
        };
        let request = TokenRequest {
            token_url: grant.access_token_url.clone(),
            client_id: self.session.state().client_id.clone(),
            client_secret: grant.client_secret.clone(),
            code,
            redirect_uri: grant.redirect_url.clone(),
        };

        self.session.emit(AuthEvent::ExchangingGrant);
        debug!(token_url = %request.token_url, "Exchanging authorization grant");
        match self.exchanger.exchange(&request).await {
            Ok(token) => {
                info!(
                    token = %AuthEvent::token_preview(&token.access_token),
                    expires_in = ?token.expires_in,
                    "Authorization code exchanged"
                );
                let next = self.session.state().with_exchanged_grant(token.clone());
                self.session.replace_state(next);
                self.failed_exchanges = 0;
                self.session
                    .emit_token(IssuedToken::AuthorizationCode(token.clone()));
                Ok(token)
            }
            Err(error) => {
                self.failed_exchanges = self.failed_exchanges.saturating_add(1);
                self.session.emit_failure(&error);
                Err(error)
            }
        }
    }

    /// Whether the held grant may still be exchanged.
    fn grant_is_exchangeable(&self) -> bool {
        self.grant().is_ok_and(|grant| {
            grant.auth_grant.is_some()
                && !grant.auth_grant_used
                && self.failed_exchanges < MAX_EXCHANGE_ATTEMPTS
        })
    }

    async fn obtain_token(&mut self) -> AuthResult<AuthCodeToken> {
        if !self.grant_is_exchangeable() {
            if self.failed_exchanges >= MAX_EXCHANGE_ATTEMPTS {
                warn!("Grant exchange failed twice, requesting a new authorization");
            }
            self.authorize().await?;
        }
        self.exchange_grant().await
    }
}

#[async_trait]
impl AuthProvider for AuthorizationCodeProvider {
    fn is_enabled(&mut self) -> bool {
        if self.session.refresh() {
            self.failed_exchanges = 0;
        }
        self.session.state().enabled
    }

    async fn auth_header(&mut self) -> AuthResult<String> {
        if self.session.refresh() {
            self.failed_exchanges = 0;
        }
        self.grant()?;
        if let Some(header) = self.session.state().authorization_header() {
            return Ok(header);
        }
        self.obtain_token().await?;
        self.session
            .state()
            .authorization_header()
            .ok_or_else(|| AuthError::invalid_configuration("token missing after exchange"))
    }
}
