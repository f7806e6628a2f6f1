//! Signed consent challenge/response tokens.
//!
//! Challenges and responses are HS256 JWTs under a server-held key; the
//! browser only ever relays them, so nothing in either token is usable
//! without the key. The challenge expiry doubles as the replay window
//! and is deliberately short (seconds, not minutes) — it bounds the gap
//! between issuing the challenge and the consent provider answering it,
//! independent of any token lifetime.
//!
//! A response must answer the challenge it was issued for: it echoes the
//! challenge's client and scopes, and validation rejects a response
//! presented against a different authorize request. Without that binding
//! a decision obtained for one request would be acceptable for any other
//! request from the same browser within the cookie's lifetime.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ConsentCookie, ConsentError, ConsentStrategy};
use crate::config::OAuthConfig;
use crate::models::AuthorizeRequest;
use crate::session::Session;

/// Claims of a consent challenge token.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeClaims {
    /// Issuer, the authorization server.
    pub iss: String,
    /// Client the authorize request was made for.
    pub aud: String,
    /// Requested scopes.
    pub scp: Vec<String>,
    /// URL the consent provider sends the user back to.
    pub redir: String,
    /// Anti-replay nonce, bound to the consent session cookie.
    pub csrf: String,
    /// Issued at (epoch seconds).
    pub iat: i64,
    /// Expiry (epoch seconds); `iat` plus the replay window.
    pub exp: i64,
}

/// Claims of a consent response token, asserting a consent decision.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConsentClaims {
    /// Issuer, the authorization server the decision answers.
    pub iss: String,
    /// Client the decision was made for, echoed from the challenge.
    pub aud: String,
    /// Scopes the user consented to, echoed from the challenge.
    pub scp: Vec<String>,
    /// Subject who granted consent.
    pub sub: String,
    /// Username of the subject, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Nonce echoed from the challenge.
    pub csrf: String,
    /// Subject identifier in the external token registry, when issued
    /// tokens must be mirrored there.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_sub: Option<String>,
    /// Extra claims carried into the session.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
    /// Expiry (epoch seconds).
    pub exp: i64,
}

/// [`ConsentStrategy`] backed by HS256-signed tokens.
pub struct SignedConsentStrategy {
    key: Vec<u8>,
    issuer: String,
    challenge_lifespan: Duration,
}

impl SignedConsentStrategy {
    /// Create a strategy with the given signing key, issuer and replay
    /// window.
    #[must_use]
    pub fn new(
        key: impl Into<Vec<u8>>,
        issuer: impl Into<String>,
        challenge_lifespan: Duration,
    ) -> Self {
        Self {
            key: key.into(),
            issuer: issuer.into(),
            challenge_lifespan,
        }
    }

    /// Create a strategy from the protocol configuration.
    #[must_use]
    pub fn from_config(config: &OAuthConfig) -> Self {
        Self::new(
            config.cookie_key.clone(),
            config.issuer.clone(),
            config.challenge_lifespan,
        )
    }

    /// Sign a consent decision. Used by co-deployed consent providers
    /// sharing the server key, and by tests.
    pub fn sign_decision(&self, claims: &ConsentClaims) -> Result<String, ConsentError> {
        sign(&self.key, claims)
    }

    /// Decode and verify a challenge token. The consent-provider side of
    /// the protocol: recover the original request's client and scopes.
    pub fn decode_challenge(&self, token: &str) -> Result<ChallengeClaims, ConsentError> {
        decode::<ChallengeClaims>(token, &DecodingKey::from_secret(&self.key), &self.validation())
            .map(|data| data.claims)
            .map_err(decode_error)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // The replay window is seconds wide; default leeway would
        // swallow it.
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation
    }
}

impl ConsentStrategy for SignedConsentStrategy {
    fn issue_challenge(
        &self,
        request: &AuthorizeRequest,
        return_url: &str,
        cookie: &mut ConsentCookie,
    ) -> Result<String, ConsentError> {
        let nonce = cookie.rotate_nonce().to_string();
        let now = Utc::now();

        let claims = ChallengeClaims {
            iss: self.issuer.clone(),
            aud: request.client.client_id.clone(),
            scp: request.scopes.clone(),
            redir: return_url.to_string(),
            csrf: nonce,
            iat: now.timestamp(),
            exp: (now + self.challenge_lifespan).timestamp(),
        };

        sign(&self.key, &claims)
    }

    fn validate_response(
        &self,
        request: &AuthorizeRequest,
        response_token: &str,
        cookie: &mut ConsentCookie,
    ) -> Result<Session, ConsentError> {
        let claims = decode::<ConsentClaims>(
            response_token,
            &DecodingKey::from_secret(&self.key),
            &self.validation(),
        )
        .map(|data| data.claims)
        .map_err(decode_error)?;

        // The decision must answer this request: same client, and every
        // scope being authorized covered by the consented set.
        if claims.aud != request.client.client_id {
            return Err(ConsentError::RequestMismatch);
        }
        if !request.scopes.iter().all(|s| claims.scp.contains(s)) {
            return Err(ConsentError::RequestMismatch);
        }

        if !cookie.matches_nonce(&claims.csrf) {
            return Err(ConsentError::CsrfMismatch);
        }

        // Consume the nonce so the same response can never validate twice.
        cookie.rotate_nonce();

        let mut session = Session::new(claims.sub);
        session.username = claims.username.unwrap_or_default();
        session.external_subject = claims.ext_sub;
        session.extra = claims.ext;
        Ok(session)
    }
}

fn sign<T: Serialize>(key: &[u8], claims: &T) -> Result<String, ConsentError> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(key)).map_err(|err| {
        match err.kind() {
            ErrorKind::Json(_) => ConsentError::Encoding(err.to_string()),
            _ => ConsentError::Signing(err.to_string()),
        }
    })
}

fn decode_error(err: jsonwebtoken::errors::Error) -> ConsentError {
    match err.kind() {
        ErrorKind::ExpiredSignature => ConsentError::Expired,
        _ => ConsentError::InvalidToken,
    }
}
