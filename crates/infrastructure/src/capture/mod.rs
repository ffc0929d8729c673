//! Authorization-grant captors.

mod browser;
mod webview;

pub use browser::{BrowserCaptor, BrowserLauncher, SystemBrowser};
pub use webview::{
    EmbeddedSurface, NavigationEvent, NavigationSurface, SurfaceCommand, WebViewCaptor,
};
