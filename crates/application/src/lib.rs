//! Warden Application - Authentication providers and ports
//!
//! This crate holds the provider state machines. I/O happens behind the
//! traits in [`ports`], implemented by the infrastructure crate.

pub mod auth;
pub mod ports;

pub use auth::{
    AuthEvent, AuthProvider, AuthorizationCodeProvider, BasicAuthProvider, DigestAuthProvider,
    ImplicitProvider, OAuth2Dependencies, ProviderContext, build_provider, implicit_provider,
};
pub use ports::{
    AuthorizationGrantCaptor, CancellationReceiver, CancellationToken, CaptorSet,
    ChallengeFetcher, Clock, FlowStateSource, TokenExchanger, TokenRequest,
};
