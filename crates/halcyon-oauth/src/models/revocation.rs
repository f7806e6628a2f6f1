//! Request model for RFC 7009 token revocation.

use serde::Deserialize;
use utoipa::ToSchema;

/// Form-encoded body of `POST /oauth2/revoke`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RevocationRequest {
    /// The token to revoke (access or refresh token).
    pub token: String,

    /// Hint about the token type: "access_token" or "refresh_token".
    pub token_type_hint: Option<String>,

    /// Client ID (alternative to HTTP Basic Auth).
    pub client_id: Option<String>,

    /// Client secret (alternative to HTTP Basic Auth).
    pub client_secret: Option<String>,
}
