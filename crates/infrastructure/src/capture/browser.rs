//! System-browser captor.
//!
//! Opens the authorization page in the user's browser and serves the redirect
//! URI on a loopback listener that lives for exactly one capture.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::Html;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;
use warden_application::ports::{
    AuthorizationGrantCaptor, CancellationReceiver, bounded_capture,
};
use warden_domain::{AuthError, AuthResult};

/// How long a stopping listener may take to drain before it is aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const CAPTURED_PAGE: &str = "<!DOCTYPE html><html><head><title>Authorization complete</title></head>\
<body><p>Authorization complete. You can close this window.</p></body></html>";

/// Port for opening a URL in the user's browser.
pub trait BrowserLauncher: Send + Sync {
    /// Opens `url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CaptureFailed`] if no browser could be started.
    fn open(&self, url: &str) -> AuthResult<()>;
}

/// Launches the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> AuthResult<()> {
        webbrowser::open(url).map_err(|e| AuthError::CaptureFailed {
            message: format!("failed to open browser: {e}"),
        })
    }
}

/// Captor serving the redirect URI on a loopback listener.
///
/// Only the path and query of the redirect reach the listener, so this
/// captor cannot see tokens delivered in the URL fragment.
pub struct BrowserCaptor {
    bind_address: String,
    timeout: Duration,
    launcher: Arc<dyn BrowserLauncher>,
}

impl BrowserCaptor {
    /// Creates a captor listening on `bind_address` (`host:port`).
    #[must_use]
    pub fn new(
        bind_address: impl Into<String>,
        timeout: Duration,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Self {
        Self {
            bind_address: bind_address.into(),
            timeout,
            launcher,
        }
    }
}

impl std::fmt::Debug for BrowserCaptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserCaptor")
            .field("bind_address", &self.bind_address)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Shared state of the redirect handler.
struct Callback {
    /// Path the redirect must hit.
    path: String,
    /// `scheme://host:port` prefixed to the captured path and query.
    origin: String,
    sender: Mutex<Option<oneshot::Sender<String>>>,
}

async fn handle_redirect(
    State(callback): State<Arc<Callback>>,
    uri: Uri,
) -> (StatusCode, Html<&'static str>) {
    if uri.path() != callback.path {
        debug!(path = %uri.path(), "Ignoring request outside the redirect path");
        return (StatusCode::NOT_FOUND, Html("Not found"));
    }

    let captured = format!("{}{uri}", callback.origin);
    let sender = callback
        .sender
        .lock()
        .ok()
        .and_then(|mut sender| sender.take());
    if let Some(sender) = sender
        && sender.send(captured).is_err()
    {
        debug!("Redirect arrived after the capture ended");
    }
    (StatusCode::OK, Html(CAPTURED_PAGE))
}

/// Running listener; stops the server when dropped.
struct ListenerGuard {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ListenerGuard {
    /// Stops accepting, lets in-flight responses finish, then releases the port.
    async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(mut task) = self.task.take()
            && tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err()
        {
            warn!("Redirect listener did not drain in time, aborting");
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn redirect_target(capture_key: &str) -> AuthResult<(String, String)> {
    let url = Url::parse(capture_key).map_err(|e| AuthError::CaptureFailed {
        message: format!("invalid redirect URI '{capture_key}': {e}"),
    })?;
    if url.scheme() != "http" {
        return Err(AuthError::CaptureFailed {
            message: format!("redirect URI '{capture_key}' is not a plain-http loopback URI"),
        });
    }
    Ok((url.path().to_string(), url.origin().ascii_serialization()))
}

#[async_trait]
impl AuthorizationGrantCaptor for BrowserCaptor {
    async fn capture(
        &self,
        authorize_url: &str,
        capture_key: &str,
        cancel: CancellationReceiver,
    ) -> AuthResult<String> {
        let (path, origin) = redirect_target(capture_key)?;
        let listener = TcpListener::bind(self.bind_address.as_str())
            .await
            .map_err(|e| AuthError::CaptureFailed {
                message: format!("failed to bind {}: {e}", self.bind_address),
            })?;

        let (redirect_tx, redirect_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = Router::new()
            .fallback(handle_redirect)
            .with_state(Arc::new(Callback {
                path,
                origin,
                sender: Mutex::new(Some(redirect_tx)),
            }));
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(error) = server.await {
                warn!(error = %error, "Redirect listener failed");
            }
        });
        let guard = ListenerGuard {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        };
        debug!(bind_address = %self.bind_address, "Redirect listener started");

        if let Err(error) = self.launcher.open(authorize_url) {
            guard.stop().await;
            return Err(error);
        }

        let wait = async {
            redirect_rx.await.map_err(|_| AuthError::CaptureFailed {
                message: "redirect listener stopped".to_string(),
            })
        };
        let result = bounded_capture(wait, self.timeout, cancel).await;
        guard.stop().await;
        result
    }

    fn sees_fragments(&self) -> bool {
        false
    }
}
