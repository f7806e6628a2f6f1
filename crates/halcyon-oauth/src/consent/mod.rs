//! Consent delegation protocol.
//!
//! The authorization endpoint never renders a consent UI itself. It mints
//! a signed, short-lived *challenge* and redirects the browser to an
//! external consent provider; the provider returns the user with a signed
//! *response* token asserting the consent decision. A server-signed
//! cookie bound to the browser session carries an anti-replay nonce
//! across that gap — the CSRF defense.

pub mod cookie;
mod strategy;

use thiserror::Error;

use crate::models::AuthorizeRequest;
use crate::session::Session;
pub use cookie::{ConsentCookie, CONSENT_COOKIE_NAME};
pub use strategy::{ChallengeClaims, ConsentClaims, SignedConsentStrategy};

/// Consent protocol failures.
///
/// Validation variants (`Expired`, `CsrfMismatch`, `RequestMismatch`,
/// `InvalidToken`) are distinguished for logging only; the error
/// responder collapses all of them into one generic access-denied so
/// callers cannot tell which defense fired.
#[derive(Debug, Error)]
pub enum ConsentError {
    /// The token is outside its replay window.
    #[error("consent token expired")]
    Expired,

    /// The nonce in the token does not match the browser cookie.
    #[error("consent nonce does not match session cookie")]
    CsrfMismatch,

    /// The response does not answer the challenge issued for this
    /// request (different client, or uncovered scopes).
    #[error("consent response does not match the authorize request")]
    RequestMismatch,

    /// The token is malformed or its signature does not verify.
    #[error("consent token invalid")]
    InvalidToken,

    /// The authorize request could not be serialized into a challenge.
    #[error("could not encode consent challenge: {0}")]
    Encoding(String),

    /// The signing key was unavailable or rejected.
    #[error("could not sign consent token: {0}")]
    Signing(String),
}

/// Capability interface for issuing consent challenges and validating
/// consent responses. Alternate consent providers plug in here without
/// touching the authorization state machine.
pub trait ConsentStrategy: Send + Sync {
    /// Bind the authorize request and return URL into a signed,
    /// time-limited challenge token, refreshing the anti-replay nonce
    /// inside `cookie`. The cookie is mutated in place; persisting it is
    /// the caller's responsibility.
    fn issue_challenge(
        &self,
        request: &AuthorizeRequest,
        return_url: &str,
        cookie: &mut ConsentCookie,
    ) -> Result<String, ConsentError>;

    /// Verify a consent response token's signature, expiry and nonce
    /// binding against `cookie`, and decode the embedded decision into a
    /// [`Session`]. On success the cookie's nonce is rotated so the same
    /// response can never validate twice.
    fn validate_response(
        &self,
        request: &AuthorizeRequest,
        response_token: &str,
        cookie: &mut ConsentCookie,
    ) -> Result<Session, ConsentError>;
}
