//! Request and response models for RFC 7662 token introspection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Form-encoded body of `POST /oauth2/introspect`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IntrospectionRequest {
    /// The token to introspect.
    pub token: String,

    /// Hint about the token type: "access_token" or "refresh_token".
    pub token_type_hint: Option<String>,

    /// Client ID (alternative to HTTP Basic Auth).
    pub client_id: Option<String>,

    /// Client secret (alternative to HTTP Basic Auth).
    pub client_secret: Option<String>,
}

/// RFC 7662 introspection response.
///
/// Inactive tokens carry only `{ "active": false }`; every other field
/// is populated only for active tokens.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IntrospectionResponse {
    /// Whether the token is currently active.
    pub active: bool,

    /// Client the token was issued to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Granted scopes, space-joined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Expiry (epoch seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued-at (epoch seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Subject the token is bound to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Username of the subject, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Audience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Extra session claims, reproduced verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub ext: Option<Map<String, Value>>,
}

impl IntrospectionResponse {
    /// The response for an invalid, expired or revoked token.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active: false,
            client_id: None,
            scope: None,
            exp: None,
            iat: None,
            sub: None,
            username: None,
            aud: None,
            ext: None,
        }
    }
}
