//! Wiring of the production adapters.

use std::sync::Arc;

use warden_application::ProviderContext;
use warden_application::ports::CaptorSet;
use warden_domain::{AuthResult, AuthSettings};

use crate::adapters::{ReqwestAuthTransport, SystemClock};
use crate::capture::{BrowserCaptor, NavigationSurface, SystemBrowser, WebViewCaptor};

/// Builds a [`ProviderContext`] backed by reqwest, the system browser and
/// the host's web view `surface`.
///
/// # Errors
///
/// Returns [`warden_domain::AuthError::Network`] if the HTTP client cannot be created.
pub fn default_provider_context(
    settings: &AuthSettings,
    surface: Arc<dyn NavigationSurface>,
) -> AuthResult<ProviderContext> {
    let transport = Arc::new(ReqwestAuthTransport::new(settings)?);
    let browser = BrowserCaptor::new(
        settings.redirect_bind_address.clone(),
        settings.capture_timeout(),
        Arc::new(SystemBrowser),
    );
    let web_view = WebViewCaptor::new(surface, settings.capture_timeout());

    Ok(ProviderContext {
        challenge_fetcher: Arc::clone(&transport) as _,
        token_exchanger: transport,
        captors: CaptorSet::new(Arc::new(browser), Arc::new(web_view)),
        clock: Arc::new(SystemClock::new()),
        local_redirect_url: settings.local_redirect_url(),
    })
}
