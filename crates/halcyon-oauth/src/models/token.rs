//! Token endpoint request and response models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form-encoded body of `POST /oauth2/token` per RFC 6749.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// Grant type: `authorization_code`, `client_credentials` or
    /// `refresh_token`.
    pub grant_type: String,

    /// Authorization code (authorization_code grant).
    pub code: Option<String>,

    /// Redirect URI used in the authorize call (authorization_code grant).
    pub redirect_uri: Option<String>,

    /// Refresh token (refresh_token grant).
    pub refresh_token: Option<String>,

    /// Requested scopes, space-separated (client_credentials grant).
    pub scope: Option<String>,

    /// Client ID (alternative to HTTP Basic Auth).
    pub client_id: Option<String>,

    /// Client secret (alternative to HTTP Basic Auth).
    pub client_secret: Option<String>,
}

/// JSON body of a successful token response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// The issued access token.
    pub access_token: String,

    /// Token type, always "bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: i64,

    /// Refresh token, when the grant produces one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scopes, space-separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}
