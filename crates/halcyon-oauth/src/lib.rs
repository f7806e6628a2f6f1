//! OAuth2 authorization server protocol core for halcyon.
//!
//! This crate implements an `OAuth2` Authorization Server whose consent
//! step is delegated to an external provider through signed challenge and
//! response tokens.
//!
//! # Supported Grant Types
//!
//! - **Authorization Code**: For web applications, consent delegated to
//!   an external provider
//! - **Client Credentials**: For service-to-service authentication
//! - **Refresh Token**: For obtaining new access tokens
//!
//! # Endpoints
//!
//! - `GET|POST /oauth2/auth` - Authorization endpoint
//! - `GET /oauth2/consent` - Placeholder consent page
//! - `POST /oauth2/token` - Token endpoint
//! - `POST /oauth2/introspect` - RFC 7662 token introspection
//! - `POST /oauth2/revoke` - RFC 7009 token revocation
//!
//! # Example
//!
//! ```rust,ignore
//! use halcyon_oauth::{oauth_router, OAuthState};
//!
//! let state = OAuthState { engine, consent, config, registry };
//! let app = oauth_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod consent;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod scope;
pub mod services;
pub mod session;

pub use config::{ConfigError, OAuthConfig};
pub use consent::{ConsentCookie, ConsentError, ConsentStrategy, SignedConsentStrategy};
pub use engine::{
    AccessRequest, AccessResponse, AuthorizeResponse, EngineError, GrantEngine, MemoryEngine,
};
pub use error::{OAuthError, OAuthErrorCode, OAuthErrorResponse};
pub use models::{
    AuthorizeParams, AuthorizeRequest, Client, IntrospectionRequest, IntrospectionResponse,
    RevocationRequest, TokenRequest, TokenResponse,
};
pub use router::{oauth_router, OAuthState};
pub use services::{RegistrationError, TokenRegistry, TokenRegistryConfig};
pub use session::{Session, TokenKind};
