//! In-memory grant engine for tests and local development.
//!
//! Codes and tokens are opaque random strings, stored under their SHA-256
//! hash. Consuming an authorization code at most once relies on the
//! atomicity of a concurrent-map removal. Production deployments are
//! expected to plug a persistent engine into [`GrantEngine`] instead.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::{AccessRequest, AccessResponse, AuthorizeResponse, EngineError, GrantEngine};
use crate::models::{AuthorizeRequest, Client, TokenRequest};
use crate::scope::parse_scope;
use crate::session::{Session, TokenKind};

/// Opaque token length in bytes (32 bytes = 256 bits).
const TOKEN_LENGTH: usize = 32;

/// Authorization code expiry.
const AUTH_CODE_EXPIRY_MINUTES: i64 = 10;

/// Refresh token expiry.
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

#[derive(Debug, Clone)]
struct StoredCode {
    client_id: String,
    redirect_uri: String,
    scopes: Vec<String>,
    session: Session,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredToken {
    client_id: String,
    grant_type: String,
    requested_scopes: Vec<String>,
    granted_scopes: Vec<String>,
    session: Session,
    requested_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// DashMap-backed [`GrantEngine`].
#[derive(Clone)]
pub struct MemoryEngine {
    clients: Arc<DashMap<String, Client>>,
    codes: Arc<DashMap<String, StoredCode>>,
    access_tokens: Arc<DashMap<String, StoredToken>>,
    refresh_tokens: Arc<DashMap<String, StoredToken>>,
    access_token_lifespan: Duration,
}

impl MemoryEngine {
    /// Create an empty engine issuing access tokens with the given
    /// default lifespan.
    #[must_use]
    pub fn new(access_token_lifespan: Duration) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            codes: Arc::new(DashMap::new()),
            access_tokens: Arc::new(DashMap::new()),
            refresh_tokens: Arc::new(DashMap::new()),
            access_token_lifespan,
        }
    }

    /// Register a client.
    pub fn register_client(&self, client: Client) {
        self.clients.insert(client.client_id.clone(), client);
    }

    /// Generate a cryptographically random opaque token.
    fn generate_token() -> String {
        let mut bytes = [0u8; TOKEN_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hash a token for storage.
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn consume_code(
        &self,
        request: &TokenRequest,
        client: &Client,
    ) -> Result<AccessRequest, EngineError> {
        let code = request
            .code
            .as_deref()
            .ok_or_else(|| EngineError::InvalidGrant("code is required".to_string()))?;
        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .ok_or_else(|| EngineError::InvalidGrant("redirect_uri is required".to_string()))?;

        // Removal is the at-most-once consumption point: a concurrent
        // second exchange of the same code sees an empty slot.
        let (_, stored) = self
            .codes
            .remove(&Self::hash_token(code))
            .ok_or_else(|| EngineError::InvalidGrant("unknown or already used code".to_string()))?;

        if stored.expires_at < Utc::now() {
            return Err(EngineError::InvalidGrant("code expired".to_string()));
        }
        if stored.client_id != client.client_id {
            return Err(EngineError::InvalidGrant(
                "code was issued to another client".to_string(),
            ));
        }
        if stored.redirect_uri != redirect_uri {
            return Err(EngineError::InvalidGrant(
                "redirect_uri does not match the authorize request".to_string(),
            ));
        }

        Ok(AccessRequest {
            client: client.clone(),
            grant_type: "authorization_code".to_string(),
            requested_scopes: stored.scopes.clone(),
            granted_scopes: stored.scopes,
            session: stored.session,
            requested_at: Utc::now(),
        })
    }

    fn rotate_refresh_token(
        &self,
        request: &TokenRequest,
        client: &Client,
    ) -> Result<AccessRequest, EngineError> {
        let token = request
            .refresh_token
            .as_deref()
            .ok_or_else(|| EngineError::InvalidGrant("refresh_token is required".to_string()))?;

        let (_, stored) = self
            .refresh_tokens
            .remove(&Self::hash_token(token))
            .ok_or_else(|| EngineError::InvalidGrant("unknown refresh token".to_string()))?;

        if stored.expires_at < Utc::now() {
            return Err(EngineError::InvalidGrant("refresh token expired".to_string()));
        }
        if stored.client_id != client.client_id {
            return Err(EngineError::InvalidGrant(
                "refresh token was issued to another client".to_string(),
            ));
        }

        Ok(AccessRequest {
            client: client.clone(),
            grant_type: "refresh_token".to_string(),
            requested_scopes: stored.requested_scopes,
            granted_scopes: stored.granted_scopes,
            session: stored.session,
            requested_at: Utc::now(),
        })
    }
}

#[async_trait::async_trait]
impl GrantEngine for MemoryEngine {
    async fn client(&self, client_id: &str) -> Result<Client, EngineError> {
        self.clients
            .get(client_id)
            .map(|entry| entry.value().clone())
            .ok_or(EngineError::UnknownClient)
    }

    async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> Result<Client, EngineError> {
        let client = self.client(client_id).await?;
        if client.is_public() {
            return Ok(client);
        }
        let stored = client.client_secret.as_deref().unwrap_or_default();
        match client_secret {
            Some(presented) if constant_time_eq(stored.as_bytes(), presented.as_bytes()) => {
                Ok(client)
            }
            _ => Err(EngineError::InvalidClientCredentials),
        }
    }

    async fn authorize_response(
        &self,
        request: &AuthorizeRequest,
        mut session: Session,
    ) -> Result<AuthorizeResponse, EngineError> {
        if request.response_type != "code" {
            return Err(EngineError::UnsupportedResponseType(
                request.response_type.clone(),
            ));
        }

        let expires_at = Utc::now() + Duration::minutes(AUTH_CODE_EXPIRY_MINUTES);
        session.set_expiry(TokenKind::AuthorizeCode, expires_at);

        let code = Self::generate_token();
        self.codes.insert(
            Self::hash_token(&code),
            StoredCode {
                client_id: request.client.client_id.clone(),
                redirect_uri: request.redirect_uri.to_string(),
                scopes: request.scopes.clone(),
                session,
                expires_at,
            },
        );

        Ok(AuthorizeResponse {
            redirect_params: vec![("code".to_string(), code)],
        })
    }

    async fn access_request(
        &self,
        request: &TokenRequest,
        client: &Client,
    ) -> Result<AccessRequest, EngineError> {
        if !client.allows_grant_type(&request.grant_type) {
            return Err(EngineError::InvalidGrant(format!(
                "client may not use grant type {}",
                request.grant_type
            )));
        }

        match request.grant_type.as_str() {
            "authorization_code" => self.consume_code(request, client),
            "refresh_token" => self.rotate_refresh_token(request, client),
            "client_credentials" => Ok(AccessRequest {
                client: client.clone(),
                grant_type: "client_credentials".to_string(),
                requested_scopes: request.scope.as_deref().map(parse_scope).unwrap_or_default(),
                granted_scopes: Vec::new(),
                session: Session::default(),
                requested_at: Utc::now(),
            }),
            other => Err(EngineError::UnsupportedGrantType(other.to_string())),
        }
    }

    async fn access_response(
        &self,
        request: &mut AccessRequest,
    ) -> Result<AccessResponse, EngineError> {
        let now = Utc::now();
        let expires_at = request
            .session
            .expiry(TokenKind::AccessToken)
            .unwrap_or(now + self.access_token_lifespan);

        let access_token = Self::generate_token();
        self.access_tokens.insert(
            Self::hash_token(&access_token),
            StoredToken {
                client_id: request.client.client_id.clone(),
                grant_type: request.grant_type.clone(),
                requested_scopes: request.requested_scopes.clone(),
                granted_scopes: request.granted_scopes.clone(),
                session: request.session.clone(),
                requested_at: request.requested_at,
                expires_at,
            },
        );

        let refresh_token = if request.grant_type != "client_credentials"
            && request.client.allows_grant_type("refresh_token")
        {
            let token = Self::generate_token();
            self.refresh_tokens.insert(
                Self::hash_token(&token),
                StoredToken {
                    client_id: request.client.client_id.clone(),
                    grant_type: request.grant_type.clone(),
                    requested_scopes: request.requested_scopes.clone(),
                    granted_scopes: request.granted_scopes.clone(),
                    session: request.session.clone(),
                    requested_at: request.requested_at,
                    expires_at: now + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
                },
            );
            Some(token)
        } else {
            None
        };

        Ok(AccessResponse {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: (expires_at - now).num_seconds(),
            scope: request.granted_scopes.join(" "),
        })
    }

    async fn introspect(&self, token: &str) -> Result<Option<AccessRequest>, EngineError> {
        let hash = Self::hash_token(token);

        let stored = match self.access_tokens.get(&hash) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };

        if stored.expires_at < Utc::now() {
            self.access_tokens.remove(&hash);
            return Ok(None);
        }

        let Some(client) = self.clients.get(&stored.client_id).map(|e| e.value().clone()) else {
            return Ok(None);
        };

        Ok(Some(AccessRequest {
            client,
            grant_type: stored.grant_type,
            requested_scopes: stored.requested_scopes,
            granted_scopes: stored.granted_scopes,
            session: stored.session,
            requested_at: stored.requested_at,
        }))
    }

    async fn revoke(&self, token: &str, _token_type_hint: Option<&str>) -> Result<(), EngineError> {
        let hash = Self::hash_token(token);
        self.access_tokens.remove(&hash);
        self.refresh_tokens.remove(&hash);
        Ok(())
    }
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn engine() -> MemoryEngine {
        let engine = MemoryEngine::new(Duration::hours(1));
        engine.register_client(Client {
            client_id: "app".to_string(),
            client_secret: Some("secret".to_string()),
            redirect_uris: vec!["https://app.example.com/cb".to_string()],
            scopes: vec!["read".to_string()],
            grant_types: vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
                "client_credentials".to_string(),
            ],
            response_types: vec!["code".to_string()],
        });
        engine
    }

    fn authorize_request(engine: &MemoryEngine) -> AuthorizeRequest {
        let client = engine.clients.get("app").unwrap().value().clone();
        AuthorizeRequest {
            client,
            response_type: "code".to_string(),
            scopes: vec!["read".to_string()],
            redirect_uri: Url::parse("https://app.example.com/cb").unwrap(),
            state: None,
            nonce: None,
            redirect_valid: true,
        }
    }

    fn code_exchange_request(code: &str) -> TokenRequest {
        TokenRequest {
            grant_type: "authorization_code".to_string(),
            code: Some(code.to_string()),
            redirect_uri: Some("https://app.example.com/cb".to_string()),
            refresh_token: None,
            scope: None,
            client_id: None,
            client_secret: None,
        }
    }

    #[tokio::test]
    async fn test_code_consumed_at_most_once() {
        let engine = engine();
        let client = engine.client("app").await.unwrap();
        let response = engine
            .authorize_response(&authorize_request(&engine), Session::new("u1"))
            .await
            .unwrap();
        let code = &response.redirect_params[0].1;

        let first = engine
            .access_request(&code_exchange_request(code), &client)
            .await;
        assert!(first.is_ok());

        let second = engine
            .access_request(&code_exchange_request(code), &client)
            .await;
        assert!(matches!(second, Err(EngineError::InvalidGrant(_))));
    }

    #[tokio::test]
    async fn test_code_bound_to_redirect_uri() {
        let engine = engine();
        let client = engine.client("app").await.unwrap();
        let response = engine
            .authorize_response(&authorize_request(&engine), Session::new("u1"))
            .await
            .unwrap();

        let mut request = code_exchange_request(&response.redirect_params[0].1);
        request.redirect_uri = Some("https://evil.example.com/cb".to_string());
        let result = engine.access_request(&request, &client).await;
        assert!(matches!(result, Err(EngineError::InvalidGrant(_))));
    }

    #[tokio::test]
    async fn test_client_secret_verified() {
        let engine = engine();
        assert!(engine.authenticate_client("app", Some("secret")).await.is_ok());
        assert!(matches!(
            engine.authenticate_client("app", Some("wrong")).await,
            Err(EngineError::InvalidClientCredentials)
        ));
        assert!(matches!(
            engine.authenticate_client("app", None).await,
            Err(EngineError::InvalidClientCredentials)
        ));
        assert!(matches!(
            engine.authenticate_client("ghost", Some("secret")).await,
            Err(EngineError::UnknownClient)
        ));
    }

    #[tokio::test]
    async fn test_public_client_authenticates_without_secret() {
        let engine = engine();
        engine.register_client(Client {
            client_id: "spa".to_string(),
            client_secret: None,
            redirect_uris: vec!["https://spa.example.com/cb".to_string()],
            scopes: vec!["read".to_string()],
            grant_types: vec!["authorization_code".to_string()],
            response_types: vec!["code".to_string()],
        });

        assert!(engine.authenticate_client("spa", None).await.is_ok());
        assert!(engine.authenticate_client("spa", Some("anything")).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_access_token_is_inactive() {
        let engine = engine();
        let client = engine.client("app").await.unwrap();

        let mut session = Session::new("u1");
        session.set_expiry(TokenKind::AccessToken, Utc::now() - Duration::seconds(1));
        let mut request = AccessRequest {
            client,
            grant_type: "client_credentials".to_string(),
            requested_scopes: vec!["read".to_string()],
            granted_scopes: vec!["read".to_string()],
            session,
            requested_at: Utc::now(),
        };

        let response = engine.access_response(&mut request).await.unwrap();
        let verdict = engine.introspect(&response.access_token).await.unwrap();
        assert!(verdict.is_none());
    }

    #[tokio::test]
    async fn test_revoked_token_is_inactive() {
        let engine = engine();
        let client = engine.client("app").await.unwrap();
        let mut request = AccessRequest {
            client,
            grant_type: "client_credentials".to_string(),
            requested_scopes: vec!["read".to_string()],
            granted_scopes: vec!["read".to_string()],
            session: Session::new("app"),
            requested_at: Utc::now(),
        };

        let response = engine.access_response(&mut request).await.unwrap();
        assert!(engine.introspect(&response.access_token).await.unwrap().is_some());

        engine.revoke(&response.access_token, None).await.unwrap();
        assert!(engine.introspect(&response.access_token).await.unwrap().is_none());

        // Revoking again (or revoking garbage) still succeeds.
        assert!(engine.revoke(&response.access_token, None).await.is_ok());
        assert!(engine.revoke("never-issued", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_token_rotation() {
        let engine = engine();
        let client = engine.client("app").await.unwrap();
        let response = engine
            .authorize_response(&authorize_request(&engine), Session::new("u1"))
            .await
            .unwrap();

        let mut access_request = engine
            .access_request(&code_exchange_request(&response.redirect_params[0].1), &client)
            .await
            .unwrap();
        let access_response = engine.access_response(&mut access_request).await.unwrap();
        let refresh = access_response.refresh_token.unwrap();

        let refresh_request = TokenRequest {
            grant_type: "refresh_token".to_string(),
            code: None,
            redirect_uri: None,
            refresh_token: Some(refresh.clone()),
            scope: None,
            client_id: None,
            client_secret: None,
        };

        let rotated = engine.access_request(&refresh_request, &client).await.unwrap();
        assert_eq!(rotated.session.subject, "u1");

        // The old refresh token was consumed by the rotation.
        let replay = engine.access_request(&refresh_request, &client).await;
        assert!(matches!(replay, Err(EngineError::InvalidGrant(_))));
    }
}
