//! The per-grant claims carrier.
//!
//! A [`Session`] is created fresh for every authorize/token call, travels
//! opaquely through the grant engine alongside the code or token it was
//! minted for, and is read back by the token issuer and the introspection
//! endpoint.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The kinds of token material a session can carry an expiry for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    AccessToken,
    RefreshToken,
    IdToken,
    AuthorizeCode,
}

/// Claims attached to a grant.
///
/// `external_subject` is the explicit channel by which a consent decision
/// requests registration of the issued token with an external system;
/// `extra` is the generic extensible claim map and is reproduced verbatim
/// in the introspection response's `ext` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Subject identifier (end-user id, or the client id for
    /// client-credentials grants).
    pub subject: String,

    /// Human-readable username, if known.
    #[serde(default)]
    pub username: String,

    /// Issuance-bound expiry per token kind. Absent kinds fall back to
    /// configured lifespans.
    #[serde(default)]
    pub expires_at: HashMap<TokenKind, DateTime<Utc>>,

    /// Subject identifier in the external token registry, when the grant
    /// must be mirrored there. Set by consent validation, consumed by the
    /// token issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_subject: Option<String>,

    /// Arbitrary extra claims.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Session {
    /// Create a session for the given subject.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Set the expiry for a token kind.
    pub fn set_expiry(&mut self, kind: TokenKind, at: DateTime<Utc>) {
        self.expires_at.insert(kind, at);
    }

    /// The stored expiry for a token kind, if any.
    #[must_use]
    pub fn expiry(&self, kind: TokenKind) -> Option<DateTime<Utc>> {
        self.expires_at.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_roundtrip() {
        let mut session = Session::new("u1");
        let at = Utc::now() + Duration::hours(1);
        session.set_expiry(TokenKind::AccessToken, at);

        assert_eq!(session.expiry(TokenKind::AccessToken), Some(at));
        assert_eq!(session.expiry(TokenKind::RefreshToken), None);
    }

    #[test]
    fn test_serde_preserves_extra_claims() {
        let mut session = Session::new("u1");
        session
            .extra
            .insert("user_id".to_string(), Value::String("abc".to_string()));

        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();

        assert_eq!(back.subject, "u1");
        assert_eq!(back.extra.get("user_id"), Some(&Value::String("abc".into())));
    }

    #[test]
    fn test_external_subject_not_serialized_when_absent() {
        let session = Session::new("u1");
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("external_subject"));
    }
}
