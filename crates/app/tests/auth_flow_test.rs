//! End-to-end tests of the providers against in-process servers.
//!
//! These tests wire the real reqwest transport and captors to an axum
//! server playing both the protected resource and the authorization server.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use warden_application::ports::CaptorSet;
use warden_application::{ProviderContext, build_provider, implicit_provider};
use warden_domain::auth::md5_hex;
use warden_domain::{
    AuthConfig, AuthSettings, AuthorizationCodeGrant, CaptureMethod, ImplicitGrant,
    OAuth2FlowState,
};
use warden_infrastructure::{
    BrowserCaptor, BrowserLauncher, EmbeddedSurface, NavigationEvent, ReqwestAuthTransport,
    SurfaceCommand, SystemClock, WebViewCaptor,
};

const NONCE: &str = "dcd98b7102dd2f0e8b11d0f600bfb0c093";

#[derive(Default)]
struct ServerState {
    exchanges: AtomicUsize,
}

async fn protected(headers: HeaderMap) -> Response {
    let expected_response = md5_hex(&format!(
        "{}:{NONCE}:{}",
        md5_hex("Mufasa:warden:Circle Of Life"),
        md5_hex("GET:/protected")
    ));
    let expected = format!(
        r#"Digest username="Mufasa", realm="warden", nonce="{NONCE}", uri="/protected", response="{expected_response}""#
    );
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => (StatusCode::OK, "welcome").into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            [(
                header::WWW_AUTHENTICATE,
                format!(r#"Digest realm="warden", qop="auth", nonce="{NONCE}""#),
            )],
        )
            .into_response(),
    }
}

async fn authorize(Query(params): Query<HashMap<String, String>>) -> Redirect {
    let redirect_uri = params.get("redirect_uri").cloned().unwrap_or_default();
    let state = params.get("state").cloned().unwrap_or_default();
    Redirect::to(&format!("{redirect_uri}?code=grant-1&state={state}"))
}

async fn token(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let first = state.exchanges.fetch_add(1, Ordering::SeqCst) == 0;
    if !first || form.get("grant_type").map(String::as_str) != Some("authorization_code") {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "invalid_grant" })),
        )
            .into_response();
    }
    Json(serde_json::json!({
        "access_token": format!("at-{}", form.get("code").cloned().unwrap_or_default()),
        "token_type": "Bearer",
        "expires_in": 3600
    }))
    .into_response()
}

async fn start_server() -> (String, Arc<ServerState>) {
    let state = Arc::new(ServerState::default());
    let router = Router::new()
        .route("/protected", get(protected))
        .route("/authorize", get(authorize))
        .route("/token", post(token))
        .with_state(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

fn free_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

/// Follows the authorization server's redirects like a real browser would.
struct FollowingBrowser;

impl BrowserLauncher for FollowingBrowser {
    fn open(&self, url: &str) -> warden_domain::AuthResult<()> {
        let url = url.to_string();
        tokio::spawn(async move {
            let _ = reqwest::Client::new().get(&url).send().await;
        });
        Ok(())
    }
}

fn context(settings: &AuthSettings, surface: EmbeddedSurface) -> ProviderContext {
    let transport = Arc::new(ReqwestAuthTransport::new(settings).unwrap());
    let timeout = Duration::from_secs(5);
    ProviderContext {
        challenge_fetcher: Arc::clone(&transport) as _,
        token_exchanger: transport,
        captors: CaptorSet::new(
            Arc::new(BrowserCaptor::new(
                settings.redirect_bind_address.clone(),
                timeout,
                Arc::new(FollowingBrowser),
            )),
            Arc::new(WebViewCaptor::new(Arc::new(surface), timeout)),
        ),
        clock: Arc::new(SystemClock::new()),
        local_redirect_url: settings.local_redirect_url(),
    }
}

fn settings() -> AuthSettings {
    AuthSettings {
        redirect_bind_address: free_address(),
        ..AuthSettings::default()
    }
}

#[tokio::test]
async fn test_digest_header_is_accepted() {
    let (base, _) = start_server().await;
    let settings = settings();
    let (surface, _commands) = EmbeddedSurface::new();
    let context = context(&settings, surface);

    let config = AuthConfig::digest("Mufasa", "Circle Of Life", format!("{base}/protected"));
    let mut provider = build_provider(&config, &context).unwrap();
    assert!(provider.is_enabled());
    let header = provider.auth_header().await.unwrap();

    let response = reqwest::Client::new()
        .get(format!("{base}/protected"))
        .header("Authorization", header)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn test_authorization_code_flow_through_browser() {
    let (base, server) = start_server().await;
    let settings = settings();
    let (surface, _commands) = EmbeddedSurface::new();
    let context = context(&settings, surface);

    let config = AuthConfig::OAuth2(
        OAuth2FlowState::authorization_code(
            "client-1",
            AuthorizationCodeGrant {
                capture_method: CaptureMethod::Browser,
                auth_url: format!("{base}/authorize"),
                access_token_url: format!("{base}/token"),
                client_secret: "secret".to_string(),
                state: "xyz".to_string(),
                ..AuthorizationCodeGrant::default()
            },
        )
        .with_scope("read write"),
    );
    let mut provider = build_provider(&config, &context).unwrap();

    assert_eq!(provider.auth_header().await.unwrap(), "Bearer at-grant-1");
    assert_eq!(provider.auth_header().await.unwrap(), "Bearer at-grant-1");
    assert_eq!(server.exchanges.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_implicit_flow_through_web_view() {
    let settings = settings();
    let (surface, mut commands) = EmbeddedSurface::new();
    let context = context(&settings, surface);

    tokio::spawn(async move {
        let mut open_views = Vec::new();
        while let Some(command) = commands.recv().await {
            if let SurfaceCommand::Open { events, .. } = command {
                let _ = events.send(NavigationEvent::Navigated(
                    "https://app.example.com/cb#access_token=implicit-1&token_type=Bearer&expires_in=60&state=s1"
                        .to_string(),
                ));
                open_views.push(events);
            }
        }
    });

    let state = OAuth2FlowState::implicit(
        "client-1",
        ImplicitGrant {
            capture_method: CaptureMethod::WebView,
            auth_url: "https://auth.example.com/authorize".to_string(),
            redirect_url: "https://app.example.com/cb".to_string(),
            state: "s1".to_string(),
            ..ImplicitGrant::default()
        },
    );
    let mut provider = implicit_provider(state, &context);
    let token = provider.access_token().await.unwrap();
    assert_eq!(token.access_token, "implicit-1");
    assert_eq!(token.expires_in, Some(60));
}
