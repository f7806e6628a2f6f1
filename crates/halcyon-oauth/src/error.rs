//! RFC 6749 error model.
//!
//! Every failure in the protocol core is classified into the canonical
//! taxonomy here and rendered exactly once, at the boundary: either as a
//! JSON error body, or — for the authorization endpoint — as a redirect
//! carrying `error`/`error_description` query parameters. The payload is
//! always derived from the taxonomy, never from raw internal error text.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::consent::ConsentError;
use crate::engine::EngineError;
use crate::models::AuthorizeRequest;
use crate::services::registration::RegistrationError;

/// OAuth2 error codes as defined in RFC 6749.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthErrorCode {
    /// The request is missing a required parameter.
    InvalidRequest,
    /// Client authentication failed.
    InvalidClient,
    /// The provided authorization grant or refresh token is invalid.
    InvalidGrant,
    /// The client is not authorized to use this grant type.
    UnauthorizedClient,
    /// The authorization server does not support the grant type.
    UnsupportedGrantType,
    /// The requested scope is invalid, unknown, or malformed.
    InvalidScope,
    /// The resource owner or the consent layer denied the request.
    AccessDenied,
    /// The authorization server does not support the response type.
    UnsupportedResponseType,
    /// The authorization server encountered an unexpected condition.
    ServerError,
    /// The authorization server is temporarily unavailable.
    TemporarilyUnavailable,
    /// The presented token is invalid or expired.
    InvalidToken,
}

impl std::fmt::Display for OAuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidScope => "invalid_scope",
            Self::AccessDenied => "access_denied",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::ServerError => "server_error",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
            Self::InvalidToken => "invalid_token",
        };
        write!(f, "{s}")
    }
}

/// OAuth2 error response body following RFC 6749 Section 5.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthErrorResponse {
    /// Stable machine-readable error code.
    pub error: OAuthErrorCode,
    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuthErrorResponse {
    /// Create a new error response.
    pub fn new(error: OAuthErrorCode, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: Some(description.into()),
        }
    }
}

/// Protocol core errors.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client authentication failed or the client is unknown.
    #[error("Invalid client: {0}")]
    InvalidClient(String),

    /// Invalid authorization code or refresh token.
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// Client not authorized for the requested grant type.
    #[error("Unauthorized client: {0}")]
    UnauthorizedClient(String),

    /// Unsupported grant type.
    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Invalid scope.
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// Access denied by the resource owner.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Unsupported response type.
    #[error("Unsupported response type: {0}")]
    UnsupportedResponseType(String),

    /// Invalid or expired token presented.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Consent challenge or response could not be verified. Deliberately
    /// carries no detail about which defense fired.
    #[error("Consent could not be verified")]
    ConsentDenied,

    /// Internal server error. The description is a stable phrase, never
    /// the underlying error text.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OAuthError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidGrant(_)
            | Self::UnsupportedGrantType(_)
            | Self::InvalidScope(_)
            | Self::UnsupportedResponseType(_) => StatusCode::BAD_REQUEST,
            Self::InvalidClient(_) | Self::UnauthorizedClient(_) | Self::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::AccessDenied(_) | Self::ConsentDenied => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Canonical RFC 6749 error code for this error.
    #[must_use]
    pub fn error_code(&self) -> OAuthErrorCode {
        match self {
            Self::InvalidRequest(_) => OAuthErrorCode::InvalidRequest,
            Self::InvalidClient(_) => OAuthErrorCode::InvalidClient,
            Self::InvalidGrant(_) => OAuthErrorCode::InvalidGrant,
            Self::UnauthorizedClient(_) => OAuthErrorCode::UnauthorizedClient,
            Self::UnsupportedGrantType(_) => OAuthErrorCode::UnsupportedGrantType,
            Self::InvalidScope(_) => OAuthErrorCode::InvalidScope,
            Self::AccessDenied(_) | Self::ConsentDenied => OAuthErrorCode::AccessDenied,
            Self::UnsupportedResponseType(_) => OAuthErrorCode::UnsupportedResponseType,
            Self::InvalidToken(_) => OAuthErrorCode::InvalidToken,
            Self::Internal(_) => OAuthErrorCode::ServerError,
        }
    }

    /// Convert to the RFC 6749 wire payload.
    #[must_use]
    pub fn to_response(&self) -> OAuthErrorResponse {
        OAuthErrorResponse::new(self.error_code(), self.to_string())
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<EngineError> for OAuthError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnknownClient => Self::InvalidClient("unknown client".to_string()),
            EngineError::InvalidClientCredentials => {
                Self::InvalidClient("client authentication failed".to_string())
            }
            EngineError::InvalidGrant(msg) => Self::InvalidGrant(msg),
            EngineError::InvalidScope(msg) => Self::InvalidScope(msg),
            EngineError::UnsupportedGrantType(gt) => Self::UnsupportedGrantType(gt),
            EngineError::UnsupportedResponseType(rt) => Self::UnsupportedResponseType(rt),
            EngineError::InvalidRedirect => {
                Self::InvalidRequest("redirect_uri is not registered for this client".to_string())
            }
            EngineError::Storage(msg) => {
                tracing::error!(error = %msg, "grant engine storage failure");
                Self::Internal("grant engine failure".to_string())
            }
        }
    }
}

impl From<ConsentError> for OAuthError {
    fn from(err: ConsentError) -> Self {
        match err {
            // Construction failures are server-side and terminal.
            ConsentError::Encoding(_) | ConsentError::Signing(_) => {
                tracing::error!(error = %err, "consent token construction failed");
                Self::Internal("could not issue consent challenge".to_string())
            }
            // Validation failures collapse to one indistinguishable denial.
            ConsentError::Expired
            | ConsentError::CsrfMismatch
            | ConsentError::RequestMismatch
            | ConsentError::InvalidToken => Self::ConsentDenied,
        }
    }
}

impl From<RegistrationError> for OAuthError {
    fn from(err: RegistrationError) -> Self {
        tracing::error!(error = %err, "external token registration failed");
        Self::Internal("token registration failed".to_string())
    }
}

/// Render an authorization-endpoint error.
///
/// Redirecting error parameters to a caller-controlled URI is permitted
/// only once that URI has been validated as registered; otherwise the
/// error parameters are appended to the configured consent URL, never to
/// anything the caller supplied.
#[must_use]
pub fn render_authorize_error(
    err: &OAuthError,
    request: Option<&AuthorizeRequest>,
    consent_url: &Url,
) -> Response {
    let payload = err.to_response();

    let target = match request.filter(|r| r.redirect_valid) {
        Some(request) => {
            let mut target = request.redirect_uri.clone();
            {
                let mut query = target.query_pairs_mut();
                query.append_pair("error", &payload.error.to_string());
                if let Some(description) = &payload.error_description {
                    query.append_pair("error_description", description);
                }
                if let Some(state) = &request.state {
                    query.append_pair("state", state);
                }
            }
            target
        }
        None => {
            let mut target = consent_url.clone();
            {
                let mut query = target.query_pairs_mut();
                query.append_pair("error", &payload.error.to_string());
                if let Some(description) = &payload.error_description {
                    query.append_pair("error_description", description);
                }
            }
            target
        }
    };

    (
        StatusCode::FOUND,
        [(header::LOCATION, target.to_string())],
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Client;

    fn request(redirect_valid: bool) -> AuthorizeRequest {
        AuthorizeRequest {
            client: Client {
                client_id: "app".to_string(),
                client_secret: None,
                redirect_uris: vec!["https://app.example.com/cb".to_string()],
                scopes: vec![],
                grant_types: vec![],
                response_types: vec![],
            },
            response_type: "code".to_string(),
            scopes: vec![],
            redirect_uri: Url::parse("https://app.example.com/cb").unwrap(),
            state: Some("xyz".to_string()),
            nonce: None,
            redirect_valid,
        }
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(OAuthErrorCode::AccessDenied.to_string(), "access_denied");
        assert_eq!(OAuthErrorCode::ServerError.to_string(), "server_error");
    }

    #[test]
    fn test_consent_denied_is_generic() {
        for err in [
            OAuthError::from(ConsentError::Expired),
            OAuthError::from(ConsentError::CsrfMismatch),
            OAuthError::from(ConsentError::RequestMismatch),
            OAuthError::from(ConsentError::InvalidToken),
        ] {
            let payload = err.to_response();
            assert_eq!(payload.error, OAuthErrorCode::AccessDenied);
            assert_eq!(
                payload.error_description.as_deref(),
                Some("Consent could not be verified")
            );
        }
    }

    #[test]
    fn test_validated_redirect_receives_error_params() {
        let consent_url = Url::parse("https://consent.example.com/ui").unwrap();
        let err = OAuthError::AccessDenied("denied".to_string());
        let response = render_authorize_error(&err, Some(&request(true)), &consent_url);

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://app.example.com/cb?"));
        assert!(location.contains("error=access_denied"));
        assert!(location.contains("state=xyz"));
    }

    #[test]
    fn test_invalid_redirect_goes_to_consent_url() {
        let consent_url = Url::parse("https://consent.example.com/ui").unwrap();
        let err = OAuthError::InvalidRequest("bad redirect".to_string());
        let response = render_authorize_error(&err, Some(&request(false)), &consent_url);

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://consent.example.com/ui?"));
        assert!(location.contains("error=invalid_request"));
    }

    #[test]
    fn test_json_error_body() {
        let err = OAuthError::InvalidGrant("code already used".to_string());
        let json = serde_json::to_string(&err.to_response()).unwrap();
        assert!(json.contains("\"error\":\"invalid_grant\""));
    }
}
