//! Digest access authentication (RFC 2617 style, MD5 without `qop`).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use super::DigestCredentials;
use crate::{AuthError, AuthResult};

/// Matches `key=value` and `key="quoted value"` pairs, or a bare auth-scheme
/// token that opens the next challenge.
static CHALLENGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r#"([A-Za-z0-9_-]+)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|([^\s,"]+))|([A-Za-z][A-Za-z0-9_-]*)"#,
    )
    .expect("valid regex")
});

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestChallenge {
    /// Protection space announced by the server.
    pub realm: String,
    /// Server nonce binding the response to this challenge.
    pub nonce: String,
    /// Every parameter found in the header, keys lower-cased.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl DigestChallenge {
    /// Parses a `WWW-Authenticate` header value.
    ///
    /// The grammar is permissive: quoted and unquoted values are accepted,
    /// the scheme token is optional, and when several challenges share one
    /// header only the parameters of the `Digest` challenge are used. A
    /// repeated parameter keeps its first value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedChallenge`] if `realm` or `nonce` is missing.
    pub fn parse(header: &str) -> AuthResult<Self> {
        let params = digest_params(header)
            .ok_or_else(|| AuthError::malformed_challenge("no Digest challenge"))?;

        let realm = params
            .get("realm")
            .cloned()
            .ok_or_else(|| AuthError::malformed_challenge("missing realm"))?;
        let nonce = params
            .get("nonce")
            .filter(|nonce| !nonce.is_empty())
            .cloned()
            .ok_or_else(|| AuthError::malformed_challenge("missing nonce"))?;

        Ok(Self {
            realm,
            nonce,
            params,
        })
    }

    /// Computes the `response` value for a request.
    #[must_use]
    pub fn response(&self, credentials: &DigestCredentials, method: &str, path: &str) -> String {
        let ha1 = md5_hex(&format!(
            "{}:{}:{}",
            credentials.username, self.realm, credentials.password
        ));
        let ha2 = md5_hex(&format!("{method}:{path}"));
        md5_hex(&format!("{ha1}:{}:{ha2}", self.nonce))
    }

    /// Builds the full `Authorization` header value.
    #[must_use]
    pub fn authorization_header(
        &self,
        credentials: &DigestCredentials,
        method: &str,
        path: &str,
    ) -> String {
        let response = self.response(credentials, method, path);
        format!(
            r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}""#,
            escape(&credentials.username),
            escape(&self.realm),
            escape(&self.nonce),
            escape(path),
            response
        )
    }
}

/// Collects the parameters of the `Digest` challenge in `header`.
///
/// Parameters before any scheme token count when the header holds no
/// explicit `Digest` challenge.
fn digest_params(header: &str) -> Option<BTreeMap<String, String>> {
    let mut leading = BTreeMap::new();
    let mut digest: Option<BTreeMap<String, String>> = None;
    let mut scheme: Option<String> = None;

    for caps in CHALLENGE_PATTERN.captures_iter(header) {
        if let Some(token) = caps.get(4) {
            let token = token.as_str().to_ascii_lowercase();
            if token == "digest" && digest.is_none() {
                digest = Some(BTreeMap::new());
            }
            scheme = Some(token);
            continue;
        }
        let Some(key) = caps.get(1).map(|key| key.as_str().to_ascii_lowercase()) else {
            continue;
        };
        let Some(value) = caps
            .get(2)
            .map(|quoted| unescape(quoted.as_str()))
            .or_else(|| caps.get(3).map(|raw| raw.as_str().to_string()))
        else {
            continue;
        };
        let target = match scheme.as_deref() {
            None => &mut leading,
            Some("digest") => match digest.as_mut() {
                Some(params) => params,
                None => continue,
            },
            Some(_) => continue,
        };
        target.entry(key).or_insert(value);
    }

    digest.or_else(|| (!leading.is_empty()).then_some(leading))
}

/// Lower-case hex MD5 of `input`. Every call hashes with a fresh context.
#[must_use]
pub fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Returns the path component of a request URL, without the query string.
///
/// # Errors
///
/// Returns [`AuthError::InvalidConfiguration`] if the URL cannot be parsed.
pub fn request_path(url: &str) -> AuthResult<String> {
    let parsed = Url::parse(url)
        .map_err(|e| AuthError::invalid_configuration(format!("invalid URL '{url}': {e}")))?;
    Ok(parsed.path().to_string())
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
