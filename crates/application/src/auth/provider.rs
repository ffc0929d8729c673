//! Authentication provider trait.
//!
//! A provider turns credentials and protocol state into a value for the
//! `Authorization` header of one configured request.

use async_trait::async_trait;
use warden_domain::AuthResult;

/// Trait for authentication providers.
///
/// Methods take `&mut self`: a provider owns mutable protocol state (cached
/// token, spent grant) and must not be driven by two callers at once. Use one
/// instance per concurrent caller.
#[async_trait]
pub trait AuthProvider: Send {
    /// Returns whether the provider should be applied to the request.
    ///
    /// `OAuth2` providers re-read their configuration first, so the answer
    /// reflects the latest user input.
    fn is_enabled(&mut self) -> bool;

    /// Computes the `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns an [`warden_domain::AuthError`] when the header cannot be
    /// computed: network failure, malformed challenge, failed capture or
    /// exchange.
    async fn auth_header(&mut self) -> AuthResult<String>;
}
