//! Warden Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod capture;
mod context;
pub mod persistence;
pub mod serialization;

pub use adapters::{ReqwestAuthTransport, SystemClock};
pub use capture::{
    BrowserCaptor, BrowserLauncher, EmbeddedSurface, NavigationEvent, NavigationSurface,
    SurfaceCommand, SystemBrowser, WebViewCaptor,
};
pub use context::default_provider_context;
pub use persistence::{SettingsError, SettingsRepository};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
