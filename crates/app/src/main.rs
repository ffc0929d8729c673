//! Warden - Main Entry Point
//!
//! Computes the `Authorization` header for an auth configuration file:
//!
//! ```text
//! warden <auth-config.json> [--settings <auth-settings.json>]
//! ```
//!
//! `OAuth2` flows open the system browser and print the authorization URL.
//! Ctrl-C cancels a pending authorization.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use warden_application::{
    AuthEvent, AuthProvider, AuthorizationCodeProvider, build_provider, implicit_provider,
};
use warden_domain::{AuthConfig, OAuth2FlowState};
use warden_infrastructure::{
    EmbeddedSurface, SettingsRepository, default_provider_context, from_json_bytes,
};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Compute an Authorization header value")]
struct Args {
    /// Auth configuration file (JSON).
    config: PathBuf,

    /// Settings file; defaults to the per-user config directory.
    #[arg(long)]
    settings: Option<PathBuf>,
}

/// Prints flow progress and wires Ctrl-C to the pending capture.
fn watch_events(mut events: mpsc::UnboundedReceiver<AuthEvent>) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                AuthEvent::AwaitingAuthorization {
                    authorize_url,
                    cancel,
                    ..
                } => {
                    eprintln!("Complete the authorization in your browser:\n  {authorize_url}");
                    tokio::spawn(async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            cancel.cancel();
                        }
                    });
                }
                AuthEvent::RedirectCaptured => eprintln!("Authorization redirect received"),
                AuthEvent::ExchangingGrant => eprintln!("Exchanging authorization grant"),
                AuthEvent::TokenIssued { expires_at, .. } => match expires_at {
                    Some(at) => eprintln!("Token issued, expires at {at}"),
                    None => eprintln!("Token issued"),
                },
                AuthEvent::Failed { error } => eprintln!("Authorization failed: {error}"),
                AuthEvent::Cancelled => eprintln!("Authorization cancelled"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let repository = args
        .settings
        .map_or_else(SettingsRepository::new, SettingsRepository::with_path);
    let settings = repository.load().await?;
    let config: AuthConfig = from_json_bytes(&tokio::fs::read(&args.config).await?)?;

    // A terminal has no embedded web view; web-view capture fails cleanly.
    let (surface, _) = EmbeddedSurface::new();
    let context = default_provider_context(&settings, Arc::new(surface))?;
    info!(config = %args.config.display(), "Computing authorization header");

    let mut provider: Box<dyn AuthProvider> = match config {
        AuthConfig::OAuth2(state) if state.grant.response_type() == "token" => {
            let mut provider = implicit_provider(state, &context);
            watch_events(provider.subscribe());
            if !provider.is_enabled() {
                warn!("Authentication is disabled");
                return Ok(());
            }
            let token = provider.access_token().await?;
            println!("{}", token.access_token);
            return Ok(());
        }
        AuthConfig::OAuth2(state) => code_provider(state, &context),
        other => match build_provider(&other, &context) {
            Some(provider) => provider,
            None => {
                warn!("No authentication configured");
                return Ok(());
            }
        },
    };

    if !provider.is_enabled() {
        warn!("Authentication is disabled");
        return Ok(());
    }
    let header = provider.auth_header().await?;
    println!("Authorization: {header}");
    Ok(())
}

fn code_provider(
    state: OAuth2FlowState,
    context: &warden_application::ProviderContext,
) -> Box<dyn AuthProvider> {
    let mut provider = AuthorizationCodeProvider::new(
        Arc::new(state),
        context.oauth2_dependencies(),
        Arc::clone(&context.token_exchanger),
    );
    watch_events(provider.subscribe());
    Box::new(provider)
}
