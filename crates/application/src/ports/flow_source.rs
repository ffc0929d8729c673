//! Source of the user-held `OAuth2` configuration.

use tokio::sync::watch;
use warden_domain::OAuth2FlowState;

/// Port for reading the latest `OAuth2` configuration.
///
/// The OAuth2 providers call this before every `is_enabled` check and header
/// computation, so edits in the UI take effect without rebuilding the provider.
pub trait FlowStateSource: Send + Sync {
    /// Returns the current configuration snapshot.
    fn current(&self) -> OAuth2FlowState;
}

/// A fixed configuration.
impl FlowStateSource for OAuth2FlowState {
    fn current(&self) -> OAuth2FlowState {
        self.clone()
    }
}

/// A configuration the owner updates through the matching `watch::Sender`.
impl FlowStateSource for watch::Receiver<OAuth2FlowState> {
    fn current(&self) -> OAuth2FlowState {
        self.borrow().clone()
    }
}
