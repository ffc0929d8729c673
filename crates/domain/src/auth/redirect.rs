//! Parsing of captured authorization redirects.

use url::{Url, form_urlencoded};

use super::ImplicitToken;
use super::flow::non_blank;
use crate::{AuthError, AuthResult};

/// Result of an authorization-code redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRedirect {
    /// The one-time grant code.
    pub code: String,
    /// The `state` echoed back by the server.
    pub state: Option<String>,
}

/// Parses the token carried in the fragment of an implicit-grant redirect.
///
/// # Errors
///
/// - [`AuthError::MalformedRedirect`] if the URL has no single `#` fragment,
///   lacks `access_token`, or carries a non-numeric `expires_in`.
/// - [`AuthError::AuthorizationFailed`] if the fragment carries `error`.
pub fn parse_implicit_redirect(redirected_url: &str) -> AuthResult<ImplicitToken> {
    let parts: Vec<&str> = redirected_url.split('#').collect();
    let [_, fragment] = parts.as_slice() else {
        return Err(AuthError::malformed_redirect(
            "redirect URL does not carry a token fragment",
        ));
    };

    let mut token = ImplicitToken::default();
    let mut access_token = None;
    let mut error = None;
    let mut error_description = None;

    for (key, value) in form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "token_type" => token.token_type = Some(value.into_owned()),
            "expires_in" => {
                let seconds = value.trim().parse::<i64>().map_err(|_| {
                    AuthError::malformed_redirect(format!("invalid expires_in value '{value}'"))
                })?;
                token.expires_in = Some(seconds);
            }
            "state" => token.state = Some(value.into_owned()),
            "scope" => token.scope = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(AuthError::AuthorizationFailed {
            message: error_description.unwrap_or(error),
        });
    }

    token.access_token = access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::malformed_redirect("fragment has no access_token"))?;
    Ok(token)
}

/// Parses the grant code carried in the query of an authorization-code redirect.
///
/// # Errors
///
/// - [`AuthError::MalformedRedirect`] if the URL cannot be parsed or has no `code`.
/// - [`AuthError::AuthorizationFailed`] if the query carries `error`.
pub fn parse_code_redirect(redirected_url: &str) -> AuthResult<CodeRedirect> {
    let url = Url::parse(redirected_url)
        .map_err(|e| AuthError::malformed_redirect(format!("invalid redirect URL: {e}")))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(AuthError::AuthorizationFailed {
            message: error_description.unwrap_or(error),
        });
    }

    let code = code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::malformed_redirect("redirect has no code parameter"))?;
    Ok(CodeRedirect { code, state })
}

/// Checks the `state` echoed by the server against the configured one.
///
/// A blank configured state disables the check.
///
/// # Errors
///
/// Returns [`AuthError::StateMismatch`] when a state was sent and the
/// server returned a different one or none at all.
pub fn verify_state(expected: &str, actual: Option<&str>) -> AuthResult<()> {
    let Some(expected) = non_blank(expected) else {
        return Ok(());
    };
    match actual {
        Some(actual) if actual == expected => Ok(()),
        other => Err(AuthError::StateMismatch {
            expected: expected.to_string(),
            actual: other.unwrap_or_default().to_string(),
        }),
    }
}
