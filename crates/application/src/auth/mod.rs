//! Authentication providers.
//!
//! This module provides:
//! - The [`AuthProvider`] trait every scheme implements
//! - Basic and Digest providers
//! - `OAuth2` implicit and authorization-code providers with their events
//! - A factory building the provider for an [`warden_domain::AuthConfig`]

mod basic;
mod digest;
mod events;
mod factory;
mod oauth2;
mod provider;

pub use basic::BasicAuthProvider;
pub use digest::DigestAuthProvider;
pub use events::AuthEvent;
pub use factory::{ProviderContext, build_provider, implicit_provider};
pub use oauth2::{AuthorizationCodeProvider, ImplicitProvider, OAuth2Dependencies};
pub use provider::AuthProvider;
