//! Halcyon Identity Provider
//!
//! Serves the OAuth2 protocol endpoints with an in-memory grant engine.
//! Production deployments replace the engine through
//! `halcyon_oauth::GrantEngine`.

mod config;
mod logging;

use std::sync::Arc;

use tokio::signal;
use tracing::info;

use config::AppConfig;
use halcyon_oauth::{
    oauth_router, Client, MemoryEngine, OAuthState, SignedConsentStrategy, TokenRegistry,
};

#[tokio::main]
async fn main() {
    // Fail-fast on missing or invalid configuration.
    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        app_env = %config.app_env,
        issuer = %config.oauth.issuer,
        consent_url = %config.oauth.consent_url,
        "Starting halcyon-idp"
    );

    let engine = MemoryEngine::new(config.oauth.access_token_lifespan);
    if !config.app_env.is_production() {
        engine.register_client(Client {
            client_id: "demo-app".to_string(),
            client_secret: Some("demo-secret".to_string()),
            redirect_uris: vec!["http://localhost:3000/callback".to_string()],
            scopes: vec!["read".to_string(), "write".to_string()],
            grant_types: vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
                "client_credentials".to_string(),
            ],
            response_types: vec!["code".to_string()],
        });
        tracing::warn!("registered the demo-app client; development mode only");
    }

    let strategy = SignedConsentStrategy::from_config(&config.oauth);
    let registry = match TokenRegistry::new(config.registry.clone()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let state = OAuthState {
        engine: Arc::new(engine),
        consent: Arc::new(strategy),
        config: Arc::new(config.oauth.clone()),
        registry: Arc::new(registry),
    };
    let app = oauth_router(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: could not bind {}: {e}", config.bind_addr);
            std::process::exit(1);
        }
    };
    info!(addr = %config.bind_addr, "Listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Error: server failed: {e}");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
