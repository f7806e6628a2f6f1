//! OAuth2 router configuration.
//!
//! Configures routes for the protocol endpoints:
//! - GET|POST /oauth2/auth - Authorization endpoint
//! - GET /oauth2/consent - Placeholder consent page
//! - POST /oauth2/token - Token endpoint
//! - POST /oauth2/introspect - RFC 7662 token introspection
//! - POST /oauth2/revoke - RFC 7009 token revocation

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::OAuthConfig;
use crate::consent::ConsentStrategy;
use crate::engine::GrantEngine;
use crate::handlers::{
    authorize_form_handler, authorize_query_handler, consent_placeholder_handler,
    introspection_handler, revocation_handler, token_handler,
};
use crate::services::TokenRegistry;

/// Authorization endpoint path.
pub const AUTH_PATH: &str = "/oauth2/auth";
/// Placeholder consent endpoint path.
pub const CONSENT_PATH: &str = "/oauth2/consent";
/// Token endpoint path.
pub const TOKEN_PATH: &str = "/oauth2/token";
/// Token introspection endpoint path.
pub const INTROSPECT_PATH: &str = "/oauth2/introspect";
/// Token revocation endpoint path.
pub const REVOKE_PATH: &str = "/oauth2/revoke";

/// Application state for the OAuth2 routes.
#[derive(Clone)]
pub struct OAuthState {
    /// Grant engine owning clients, codes and token storage.
    pub engine: Arc<dyn GrantEngine>,
    /// Consent challenge/response strategy.
    pub consent: Arc<dyn ConsentStrategy>,
    /// Protocol configuration.
    pub config: Arc<OAuthConfig>,
    /// External token registry client.
    pub registry: Arc<TokenRegistry>,
}

/// Create the OAuth2 router with all protocol routes configured.
pub fn oauth_router(state: OAuthState) -> Router {
    Router::new()
        .route(
            AUTH_PATH,
            get(authorize_query_handler).post(authorize_form_handler),
        )
        .route(CONSENT_PATH, get(consent_placeholder_handler))
        .route(TOKEN_PATH, post(token_handler))
        .route(INTROSPECT_PATH, post(introspection_handler))
        .route(REVOKE_PATH, post(revocation_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
