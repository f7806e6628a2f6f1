//! Shared client authentication utilities.
//!
//! Extracts OAuth2 client credentials from HTTP Basic Auth or form body
//! parameters (RFC 6749 Section 2.3). Used by the token, introspection
//! and revocation handlers.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::OAuthError;

/// Extract client credentials from the Authorization header or form body
/// parameters. Basic Auth takes precedence.
///
/// Returns `(client_id, Option<client_secret>)`.
pub fn extract_client_credentials(
    headers: &HeaderMap,
    body_client_id: Option<&str>,
    body_client_secret: Option<&str>,
) -> Result<(String, Option<String>), OAuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| OAuthError::InvalidClient("Invalid authorization header".to_string()))?;

        if let Some(credentials) = auth_str.strip_prefix("Basic ") {
            let decoded = STANDARD.decode(credentials).map_err(|_| {
                OAuthError::InvalidClient("Invalid base64 in authorization header".to_string())
            })?;

            let decoded_str = String::from_utf8(decoded).map_err(|_| {
                OAuthError::InvalidClient("Invalid UTF-8 in credentials".to_string())
            })?;

            let parts: Vec<&str> = decoded_str.splitn(2, ':').collect();
            if parts.len() == 2 {
                return Ok((parts[0].to_string(), Some(parts[1].to_string())));
            }
            return Err(OAuthError::InvalidClient(
                "Invalid credential format".to_string(),
            ));
        }
    }

    let client_id = body_client_id
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| OAuthError::InvalidRequest("client_id is required".to_string()))?;

    Ok((client_id, body_client_secret.map(String::from)))
}
