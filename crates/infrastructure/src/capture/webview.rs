//! Embedded web-view captor.
//!
//! The host application owns the actual web view. It reports every
//! navigation, so this captor also sees URL fragments.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use warden_application::ports::{
    AuthorizationGrantCaptor, CancellationReceiver, bounded_capture,
};
use warden_domain::{AuthError, AuthResult};

/// Navigation reported by a [`NavigationSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// The surface navigated to this URL.
    Navigated(String),
    /// The user closed the surface.
    Closed,
}

/// Port for the host's embedded web view.
#[async_trait]
pub trait NavigationSurface: Send + Sync {
    /// Shows the surface at `url` and returns its navigation events.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CaptureFailed`] if the surface cannot be shown.
    async fn open(&self, url: &str) -> AuthResult<mpsc::UnboundedReceiver<NavigationEvent>>;

    /// Hides the surface.
    fn close(&self);
}

/// Command sent by an [`EmbeddedSurface`] to the host UI.
#[derive(Debug)]
pub enum SurfaceCommand {
    /// Show a web view at `url` and report navigations on `events`.
    Open {
        /// Authorization URL to load.
        url: String,
        /// Sink for the navigations of the web view.
        events: mpsc::UnboundedSender<NavigationEvent>,
    },
    /// Hide the web view.
    Close,
}

/// [`NavigationSurface`] bridged over a channel to the host UI thread.
#[derive(Debug, Clone)]
pub struct EmbeddedSurface {
    commands: mpsc::UnboundedSender<SurfaceCommand>,
}

impl EmbeddedSurface {
    /// Creates the surface and the command stream the host must serve.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SurfaceCommand>) {
        let (commands, rx) = mpsc::unbounded_channel();
        (Self { commands }, rx)
    }
}

#[async_trait]
impl NavigationSurface for EmbeddedSurface {
    async fn open(&self, url: &str) -> AuthResult<mpsc::UnboundedReceiver<NavigationEvent>> {
        let (events, rx) = mpsc::unbounded_channel();
        self.commands
            .send(SurfaceCommand::Open {
                url: url.to_string(),
                events,
            })
            .map_err(|_| AuthError::CaptureFailed {
                message: "no web view host attached".to_string(),
            })?;
        Ok(rx)
    }

    fn close(&self) {
        if self.commands.send(SurfaceCommand::Close).is_err() {
            debug!("Web view host already gone");
        }
    }
}

/// Closes the surface when dropped.
struct SurfaceGuard<'a>(&'a dyn NavigationSurface);

impl Drop for SurfaceGuard<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Captor watching an embedded web view for the redirect.
pub struct WebViewCaptor {
    surface: Arc<dyn NavigationSurface>,
    timeout: Duration,
}

impl WebViewCaptor {
    /// Creates a captor driving `surface`.
    #[must_use]
    pub fn new(surface: Arc<dyn NavigationSurface>, timeout: Duration) -> Self {
        Self { surface, timeout }
    }
}

impl std::fmt::Debug for WebViewCaptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebViewCaptor")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthorizationGrantCaptor for WebViewCaptor {
    async fn capture(
        &self,
        authorize_url: &str,
        capture_key: &str,
        cancel: CancellationReceiver,
    ) -> AuthResult<String> {
        let mut events = self.surface.open(authorize_url).await?;
        let _guard = SurfaceGuard(self.surface.as_ref());

        let wait = async {
            while let Some(event) = events.recv().await {
                match event {
                    NavigationEvent::Navigated(url) if is_redirect_to(&url, capture_key) => {
                        return Ok(url);
                    }
                    NavigationEvent::Navigated(url) => {
                        debug!(url = %url, "Web view navigated");
                    }
                    NavigationEvent::Closed => break,
                }
            }
            Err(AuthError::CaptureCancelled)
        };
        bounded_capture(wait, self.timeout, cancel).await
    }

    fn sees_fragments(&self) -> bool {
        true
    }
}

/// Whether `url` is `capture_key` itself or lies beneath it.
fn is_redirect_to(url: &str, capture_key: &str) -> bool {
    url.strip_prefix(capture_key).is_some_and(|rest| {
        rest.is_empty()
            || capture_key.ends_with(['/', '?', '#'])
            || rest.starts_with(['?', '#', '/'])
    })
}
