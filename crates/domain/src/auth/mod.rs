//! Authentication domain types

mod config;
mod credentials;
mod digest;
mod flow;
mod redirect;
mod token;

pub use config::AuthConfig;
pub use credentials::{BasicCredentials, DigestCredentials};
pub use digest::{DigestChallenge, md5_hex, request_path};
pub use flow::{
    AuthorizationCodeGrant, CaptureMethod, DEFAULT_HEADER_PREFIX, FlowGrant, ImplicitGrant,
    OAuth2FlowState, non_blank,
};
pub use redirect::{CodeRedirect, parse_code_redirect, parse_implicit_redirect, verify_state};
pub use token::{AuthCodeToken, ImplicitToken, IssuedToken};
