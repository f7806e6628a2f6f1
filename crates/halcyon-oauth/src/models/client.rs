//! Registered OAuth2 client.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered client, owned by the grant engine and referenced
/// read-only by the protocol core.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Client {
    /// Public client identifier.
    pub client_id: String,

    /// Client secret for confidential clients. `None` for public clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Registered redirect URIs (exact-match validated).
    pub redirect_uris: Vec<String>,

    /// Scopes the client may be granted (hierarchic matching applies).
    pub scopes: Vec<String>,

    /// Grant types the client may use.
    pub grant_types: Vec<String>,

    /// Response types the client may request at the authorization endpoint.
    pub response_types: Vec<String>,
}

impl Client {
    /// Whether the client registered the given redirect URI.
    #[must_use]
    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }

    /// Whether the client may use the given grant type.
    #[must_use]
    pub fn allows_grant_type(&self, grant_type: &str) -> bool {
        self.grant_types.iter().any(|g| g == grant_type)
    }

    /// Whether the client may request the given response type.
    #[must_use]
    pub fn allows_response_type(&self, response_type: &str) -> bool {
        self.response_types.iter().any(|r| r == response_type)
    }

    /// Whether the client is public (no secret registered).
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.client_secret.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client {
            client_id: "app".to_string(),
            client_secret: Some("secret".to_string()),
            redirect_uris: vec!["https://app.example.com/cb".to_string()],
            scopes: vec!["read".to_string()],
            grant_types: vec!["authorization_code".to_string()],
            response_types: vec!["code".to_string()],
        }
    }

    #[test]
    fn test_redirect_uri_exact_match() {
        let c = client();
        assert!(c.has_redirect_uri("https://app.example.com/cb"));
        assert!(!c.has_redirect_uri("https://app.example.com/cb/"));
        assert!(!c.has_redirect_uri("https://evil.example.com/cb"));
    }

    #[test]
    fn test_public_client() {
        let mut c = client();
        assert!(!c.is_public());
        c.client_secret = None;
        assert!(c.is_public());
    }
}
