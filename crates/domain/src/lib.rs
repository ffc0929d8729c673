//! Warden Domain - Core authentication types
//!
//! This crate defines the credentials, challenges, tokens and `OAuth2` flow
//! state used to compute `Authorization` headers.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod settings;

pub use auth::{
    AuthCodeToken, AuthConfig, AuthorizationCodeGrant, BasicCredentials, CaptureMethod,
    DigestChallenge, DigestCredentials, FlowGrant, ImplicitGrant, ImplicitToken, IssuedToken,
    OAuth2FlowState,
};
pub use error::{AuthError, AuthResult};
pub use settings::AuthSettings;
