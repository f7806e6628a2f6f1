//! Grant engine boundary.
//!
//! The protocol core orchestrates an external grant engine — the
//! component that owns clients, authorization codes and token storage,
//! and enforces "consume a code at most once" atomically. Everything the
//! core needs from it is expressed through the [`GrantEngine`] capability
//! trait so storage backends can be substituted without touching the
//! handlers.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{AuthorizeRequest, Client, TokenRequest};
use crate::session::Session;

pub use memory::MemoryEngine;

/// Failures surfaced by a grant engine.
///
/// Classified variants map onto their RFC 6749 counterparts; everything
/// the engine cannot classify arrives as [`EngineError::Storage`] and is
/// rendered as `server_error`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown client")]
    UnknownClient,

    #[error("client authentication failed")]
    InvalidClientCredentials,

    #[error("invalid grant: {0}")]
    InvalidGrant(String),

    #[error("invalid scope: {0}")]
    InvalidScope(String),

    #[error("unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    #[error("unsupported response type: {0}")]
    UnsupportedResponseType(String),

    #[error("redirect URI not registered")]
    InvalidRedirect,

    #[error("storage failure: {0}")]
    Storage(String),
}

/// A validated token request, as the engine materialized it.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// The authenticated client.
    pub client: Client,
    /// The grant type being exercised.
    pub grant_type: String,
    /// Scopes the caller asked for.
    pub requested_scopes: Vec<String>,
    /// Scopes actually granted. For stored grants (code, refresh token)
    /// the engine fills these from the stored authorization; for
    /// client-credentials the token issuer grants them.
    pub granted_scopes: Vec<String>,
    /// The session bound to the grant.
    pub session: Session,
    /// When the request was received.
    pub requested_at: DateTime<Utc>,
}

impl AccessRequest {
    /// Grant a scope, ignoring duplicates.
    pub fn grant_scope(&mut self, scope: &str) {
        if !self.granted_scopes.iter().any(|s| s == scope) {
            self.granted_scopes.push(scope.to_string());
        }
    }
}

/// Token material produced for a validated access request.
#[derive(Debug, Clone)]
pub struct AccessResponse {
    /// The issued access token.
    pub access_token: String,
    /// Refresh token, when the grant produces one.
    pub refresh_token: Option<String>,
    /// Always "bearer".
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Granted scopes, space-joined.
    pub scope: String,
}

/// Parameters the engine wants appended to the success redirect of an
/// authorize call (`code=...` for the code response type).
#[derive(Debug, Clone)]
pub struct AuthorizeResponse {
    pub redirect_params: Vec<(String, String)>,
}

/// Capability interface over the external grant engine.
#[async_trait]
pub trait GrantEngine: Send + Sync {
    /// Look up a client by its public identifier.
    async fn client(&self, client_id: &str) -> Result<Client, EngineError>;

    /// Authenticate a client from its credentials. Public clients
    /// authenticate with `client_id` alone.
    async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> Result<Client, EngineError>;

    /// Produce the final authorize response for a consented request:
    /// mint the code (or token, per response type) bound to `session`.
    async fn authorize_response(
        &self,
        request: &AuthorizeRequest,
        session: Session,
    ) -> Result<AuthorizeResponse, EngineError>;

    /// Validate a token request against stored grants. Consuming an
    /// authorization code at most once is the engine's responsibility;
    /// an already-consumed code is a normal [`EngineError::InvalidGrant`].
    async fn access_request(
        &self,
        request: &TokenRequest,
        client: &Client,
    ) -> Result<AccessRequest, EngineError>;

    /// Mint the token material for a validated access request.
    async fn access_response(
        &self,
        request: &mut AccessRequest,
    ) -> Result<AccessResponse, EngineError>;

    /// Resolve an access token to its stored request. `Ok(None)` is the
    /// engine's authoritative "inactive" verdict (expired, revoked or
    /// unknown); the core never fabricates that verdict itself.
    async fn introspect(&self, token: &str) -> Result<Option<AccessRequest>, EngineError>;

    /// Invalidate a token. Revoking an unknown or already-revoked token
    /// succeeds indistinguishably from revoking a live one.
    async fn revoke(&self, token: &str, token_type_hint: Option<&str>) -> Result<(), EngineError>;
}
