//! Challenge fetch and token exchange over reqwest.
//!
//! This adapter implements the `ChallengeFetcher` and `TokenExchanger` ports.
//! Redirects are never followed: a challenge or token response is read from
//! the first hop.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Client, Method};
use serde::Deserialize;
use tracing::debug;
use warden_application::ports::{ChallengeFetcher, TokenExchanger, TokenRequest};
use warden_domain::{AuthCodeToken, AuthError, AuthResult, AuthSettings};

/// Content-Type for form-urlencoded data.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// `OAuth2` error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// HTTP transport for the Digest and authorization-code providers.
#[derive(Debug, Clone)]
pub struct ReqwestAuthTransport {
    client: Client,
}

impl ReqwestAuthTransport {
    /// Creates a transport with the timeouts and User-Agent from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] if the client cannot be created.
    pub fn new(settings: &AuthSettings) -> AuthResult<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.request_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Creates a transport with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Maps reqwest errors to [`AuthError::Network`].
    fn map_error(error: &reqwest::Error) -> AuthError {
        if error.is_timeout() {
            return AuthError::network(format!("request timed out: {error}"));
        }
        if error.is_connect() {
            return AuthError::network(format!("connection failed: {error}"));
        }
        AuthError::network(error.to_string())
    }

    /// Picks the Digest challenge among several `WWW-Authenticate` headers.
    fn select_challenge<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
        let values: Vec<&str> = values.collect();
        values
            .iter()
            .find(|value| {
                value
                    .trim_start()
                    .get(..6)
                    .is_some_and(|scheme| scheme.eq_ignore_ascii_case("digest"))
            })
            .or_else(|| values.first())
            .map(|value| (*value).to_string())
    }
}

#[async_trait]
impl ChallengeFetcher for ReqwestAuthTransport {
    async fn fetch_challenge(&self, method: &str, url: &str) -> AuthResult<Option<String>> {
        let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
            AuthError::invalid_configuration(format!("invalid HTTP method '{method}'"))
        })?;

        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|e| Self::map_error(&e))?;

        debug!(status = %response.status(), "Digest challenge response received");
        let challenge = Self::select_challenge(
            response
                .headers()
                .get_all(WWW_AUTHENTICATE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );
        Ok(challenge)
    }
}

#[async_trait]
impl TokenExchanger for ReqwestAuthTransport {
    async fn exchange(&self, request: &TokenRequest) -> AuthResult<AuthCodeToken> {
        let body = serde_urlencoded::to_string(request.form_params())
            .map_err(|e| AuthError::network(format!("failed to encode form: {e}")))?;

        let response = self
            .client
            .post(&request.token_url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| Self::map_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.map_err(|e| {
                AuthError::network(format!("failed to read token error response: {e}"))
            })?;
            if status.is_server_error() {
                return Err(AuthError::network(format!(
                    "token endpoint unavailable ({status}): {error_text}"
                )));
            }
            if let Ok(error_response) = serde_json::from_str::<TokenErrorResponse>(&error_text) {
                return Err(AuthError::AuthorizationFailed {
                    message: error_response
                        .error_description
                        .unwrap_or(error_response.error),
                });
            }
            return Err(AuthError::AuthorizationFailed {
                message: format!("token request failed with {status}: {error_text}"),
            });
        }

        response
            .json::<AuthCodeToken>()
            .await
            .map_err(|e| AuthError::network(format!("failed to parse token response: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{any, post};
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn transport() -> ReqwestAuthTransport {
        ReqwestAuthTransport::new(&AuthSettings::default()).unwrap()
    }

    #[test]
    fn test_select_challenge_prefers_digest() {
        let picked = ReqwestAuthTransport::select_challenge(
            ["Basic realm=\"x\"", "Digest realm=\"r\", nonce=\"n\""].into_iter(),
        );
        assert_eq!(picked.as_deref(), Some("Digest realm=\"r\", nonce=\"n\""));

        let only = ReqwestAuthTransport::select_challenge(["Bearer"].into_iter());
        assert_eq!(only.as_deref(), Some("Bearer"));
        assert_eq!(ReqwestAuthTransport::select_challenge(std::iter::empty()), None);
    }

    #[tokio::test]
    async fn test_fetch_challenge_reads_header_with_method() {
        let seen = Arc::new(Mutex::new(String::new()));
        let router = Router::new()
            .route(
                "/protected",
                any(
                    |State(seen): State<Arc<Mutex<String>>>, method: axum::http::Method| async move {
                        *seen.lock().unwrap() = method.to_string();
                        (
                            StatusCode::UNAUTHORIZED,
                            [(
                                WWW_AUTHENTICATE,
                                r#"Digest realm="test", nonce="abc""#,
                            )],
                        )
                    },
                ),
            )
            .with_state(Arc::clone(&seen));
        let base = serve(router).await;

        let challenge = transport()
            .fetch_challenge("PUT", &format!("{base}/protected"))
            .await
            .unwrap();
        assert_eq!(challenge.as_deref(), Some(r#"Digest realm="test", nonce="abc""#));
        assert_eq!(seen.lock().unwrap().as_str(), "PUT");
    }

    #[tokio::test]
    async fn test_fetch_challenge_without_header() {
        let base = serve(Router::new().route("/open", any(|| async { "ok" }))).await;
        let challenge = transport()
            .fetch_challenge("GET", &format!("{base}/open"))
            .await
            .unwrap();
        assert_eq!(challenge, None);
    }

    #[tokio::test]
    async fn test_fetch_challenge_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport()
            .fetch_challenge("GET", &format!("http://{addr}/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Network { .. }));
    }

    fn request(token_url: String) -> TokenRequest {
        TokenRequest {
            token_url,
            client_id: "client 1".to_string(),
            client_secret: "s&cret".to_string(),
            code: "grant".to_string(),
            redirect_uri: "http://127.0.0.1:8080/callback".to_string(),
        }
    }

    #[tokio::test]
    async fn test_exchange_posts_form() {
        let captured = Arc::new(Mutex::new((String::new(), String::new())));
        let router = Router::new()
            .route(
                "/token",
                post(
                    |State(captured): State<Arc<Mutex<(String, String)>>>,
                     headers: HeaderMap,
                     body: String| async move {
                        let content_type = headers
                            .get(CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        *captured.lock().unwrap() = (content_type, body);
                        Json(serde_json::json!({
                            "access_token": "at-1",
                            "token_type": "Bearer",
                            "expires_in": 3600,
                            "refresh_token": "rt-1"
                        }))
                    },
                ),
            )
            .with_state(Arc::clone(&captured));
        let base = serve(router).await;

        let token = transport()
            .exchange(&request(format!("{base}/token")))
            .await
            .unwrap();
        assert_eq!(token.access_token, "at-1");
        assert_eq!(token.expires_in, Some(3600));
        assert_eq!(token.refresh_token.as_deref(), Some("rt-1"));

        let (content_type, body) = captured.lock().unwrap().clone();
        assert_eq!(content_type, FORM_CONTENT_TYPE);
        assert_eq!(
            body,
            "client_id=client+1&client_secret=s%26cret&code=grant&redirect_uri=http%3A%2F%2F127.0.0.1%3A8080%2Fcallback&grant_type=authorization_code"
        );
    }

    #[tokio::test]
    async fn test_exchange_error_response() {
        let router = Router::new().route(
            "/token",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": "invalid_grant",
                        "error_description": "Code already used"
                    })),
                )
                    .into_response()
            }),
        );
        let base = serve(router).await;

        let err = transport()
            .exchange(&request(format!("{base}/token")))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::AuthorizationFailed {
                message: "Code already used".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_exchange_invalid_json() {
        let base = serve(Router::new().route("/token", post(|| async { "not json" }))).await;
        let err = transport()
            .exchange(&request(format!("{base}/token")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Network { .. }));
    }

    #[tokio::test]
    async fn test_exchange_server_error_is_network() {
        let router = Router::new().route(
            "/token",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down").into_response() }),
        );
        let base = serve(router).await;

        let err = transport()
            .exchange(&request(format!("{base}/token")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Network { .. }));
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_exchange_client_error_without_json_body() {
        let router = Router::new().route(
            "/token",
            post(|| async { (StatusCode::UNAUTHORIZED, "nope").into_response() }),
        );
        let base = serve(router).await;

        let err = transport()
            .exchange(&request(format!("{base}/token")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AuthorizationFailed { .. }));
    }
}
