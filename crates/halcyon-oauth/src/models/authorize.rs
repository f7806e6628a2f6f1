//! Authorization request models.

use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::IntoParams;

use crate::models::Client;

/// Raw parameters of a `GET|POST /oauth2/auth` call, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams)]
pub struct AuthorizeParams {
    /// Response type ("code", "token", ...).
    pub response_type: String,
    /// Client ID.
    pub client_id: String,
    /// Redirect URI (must exactly match a registered URI).
    pub redirect_uri: String,
    /// Requested scopes (space-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Opaque state echoed back to the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// OIDC nonce (echoed in the ID token by the grant engine).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Signed consent proof returned by the consent provider. Absent on
    /// the first pass through the authorization endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent: Option<String>,
}

/// A validated authorization request.
///
/// Constructed only after the client was resolved and the redirect URI
/// matched a registered one; a request that never reaches this state must
/// not receive an error via a caller-supplied redirect.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    /// The resolved client.
    pub client: Client,
    /// Requested response type.
    pub response_type: String,
    /// Requested scopes.
    pub scopes: Vec<String>,
    /// The validated redirect URI.
    pub redirect_uri: Url,
    /// State echoed on every redirect back to the client.
    pub state: Option<String>,
    /// OIDC nonce.
    pub nonce: Option<String>,
    /// Whether the redirect URI passed client-registration validation.
    /// Once false, errors for this request use the non-redirect channel.
    pub redirect_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_roundtrip_as_query_string() {
        let params = AuthorizeParams {
            response_type: "code".to_string(),
            client_id: "app".to_string(),
            redirect_uri: "https://app.example.com/cb".to_string(),
            scope: Some("read".to_string()),
            state: Some("xyz".to_string()),
            nonce: None,
            consent: None,
        };

        let qs = serde_urlencoded::to_string(&params).unwrap();
        assert!(!qs.contains("consent"));
        assert!(!qs.contains("nonce"));

        let back: AuthorizeParams = serde_urlencoded::from_str(&qs).unwrap();
        assert_eq!(back.client_id, "app");
        assert_eq!(back.scope.as_deref(), Some("read"));
    }
}
