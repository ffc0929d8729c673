//! Builds the provider matching an [`AuthConfig`].

use std::sync::Arc;

use warden_domain::{AuthConfig, OAuth2FlowState};

use super::oauth2::{AuthorizationCodeProvider, ImplicitProvider, OAuth2Dependencies};
use super::{AuthProvider, BasicAuthProvider, DigestAuthProvider};
use crate::ports::{CaptorSet, ChallengeFetcher, Clock, TokenExchanger};

/// Adapters the factory wires into providers.
#[derive(Clone)]
pub struct ProviderContext {
    /// Fetches Digest challenges.
    pub challenge_fetcher: Arc<dyn ChallengeFetcher>,
    /// Exchanges authorization codes.
    pub token_exchanger: Arc<dyn TokenExchanger>,
    /// Redirect captors.
    pub captors: CaptorSet,
    /// Timestamps issued tokens.
    pub clock: Arc<dyn Clock>,
    /// Redirect URI served by the browser captor.
    pub local_redirect_url: String,
}

impl ProviderContext {
    /// Dependencies for the `OAuth2` providers.
    #[must_use]
    pub fn oauth2_dependencies(&self) -> OAuth2Dependencies {
        OAuth2Dependencies {
            captors: self.captors.clone(),
            clock: Arc::clone(&self.clock),
            local_redirect_url: self.local_redirect_url.clone(),
        }
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("local_redirect_url", &self.local_redirect_url)
            .finish_non_exhaustive()
    }
}

/// Builds the header-producing provider for `config`.
///
/// Returns `None` for [`AuthConfig::None`]. An implicit `OAuth2` config
/// yields an [`ImplicitProvider`], whose `auth_header` always fails; use
/// [`implicit_provider`] to obtain its token.
#[must_use]
pub fn build_provider(
    config: &AuthConfig,
    context: &ProviderContext,
) -> Option<Box<dyn AuthProvider>> {
    match config {
        AuthConfig::None => None,
        AuthConfig::Basic {
            credentials,
            enabled,
        } => Some(Box::new(BasicAuthProvider::from_credentials(
            credentials.clone(),
            *enabled,
        ))),
        AuthConfig::Digest {
            credentials,
            url,
            method,
            enabled,
        } => Some(Box::new(DigestAuthProvider::new(
            credentials.clone(),
            method.clone(),
            url.clone(),
            *enabled,
            Arc::clone(&context.challenge_fetcher),
        ))),
        AuthConfig::OAuth2(state) if config.is_implicit() => {
            Some(Box::new(implicit_provider(state.clone(), context)))
        }
        AuthConfig::OAuth2(state) => Some(Box::new(AuthorizationCodeProvider::new(
            Arc::new(state.clone()),
            context.oauth2_dependencies(),
            Arc::clone(&context.token_exchanger),
        ))),
    }
}

/// Builds an [`ImplicitProvider`] over a fixed flow state.
#[must_use]
pub fn implicit_provider(state: OAuth2FlowState, context: &ProviderContext) -> ImplicitProvider {
    ImplicitProvider::new(Arc::new(state), context.oauth2_dependencies())
}
