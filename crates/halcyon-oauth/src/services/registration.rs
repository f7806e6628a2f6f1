//! External token registry client.
//!
//! Tokens issued to sessions carrying an external subject are mirrored
//! into a remote registry in two steps: create the token with its
//! validity window, then assign it to the subject. The token issuer
//! treats a failure of either step as fatal for the whole exchange
//! (fail-closed), so this client reports every non-success outcome as an
//! error rather than logging and moving on.

use chrono::{Duration, SecondsFormat, Utc};
use serde_json::json;
use thiserror::Error;

/// Registry client failures.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The registry endpoint needed for this call is not configured.
    #[error("token registry is not configured: {0}")]
    Disabled(&'static str),

    /// Building the HTTP client failed (bad root certificate).
    #[error("could not build registry HTTP client: {0}")]
    Client(String),

    /// The registry call failed or returned a non-success status.
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Construction-time configuration for the registry client. Absent URLs
/// disable the integration; the token issuer turns that absence into a
/// hard failure only on the fail-closed path that requires it.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistryConfig {
    /// Endpoint for creating a token with its validity window.
    pub token_url: Option<String>,

    /// Endpoint for assigning a token to a subject.
    pub assignment_url: Option<String>,

    /// Bearer credential presented to both endpoints.
    pub bearer_token: Option<String>,

    /// PEM-encoded custom trust root for the registry's TLS connections.
    pub root_ca_pem: Option<Vec<u8>>,
}

/// HTTP client for the external token registry.
pub struct TokenRegistry {
    config: TokenRegistryConfig,
    http: reqwest::Client,
}

impl TokenRegistry {
    /// Build a registry client. Fails only when the configured root
    /// certificate cannot be parsed.
    pub fn new(config: TokenRegistryConfig) -> Result<Self, RegistrationError> {
        let mut builder = reqwest::Client::builder();
        if let Some(pem) = &config.root_ca_pem {
            let cert = reqwest::Certificate::from_pem(pem)
                .map_err(|err| RegistrationError::Client(err.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder
            .build()
            .map_err(|err| RegistrationError::Client(err.to_string()))?;
        Ok(Self { config, http })
    }

    /// Register a token with its validity window.
    pub async fn create_token(
        &self,
        token: &str,
        expires_in: i64,
    ) -> Result<(), RegistrationError> {
        let url = self
            .config
            .token_url
            .as_deref()
            .ok_or(RegistrationError::Disabled("token URL is not set"))?;

        let start = Utc::now();
        let end = start + Duration::seconds(expires_in);
        let body = json!({
            "token": token,
            "start": start.to_rfc3339_opts(SecondsFormat::Secs, true),
            "end": end.to_rfc3339_opts(SecondsFormat::Secs, true),
        });
        tracing::debug!(target: "token_registry", url = %url, "creating registry token");

        let response = self
            .http
            .post(url)
            .bearer_auth(self.config.bearer_token.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(target: "token_registry", status = %response.status(), "registry token created");
        Ok(())
    }

    /// Assign a previously created token to a subject.
    pub async fn assign_token(
        &self,
        token: &str,
        subject: &str,
    ) -> Result<(), RegistrationError> {
        let url = self
            .config
            .assignment_url
            .as_deref()
            .ok_or(RegistrationError::Disabled("assignment URL is not set"))?;

        let body = json!({ "token": token, "userid": subject });
        tracing::debug!(target: "token_registry", url = %url, subject = %subject, "assigning registry token");

        let response = self
            .http
            .post(url)
            .bearer_auth(self.config.bearer_token.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(target: "token_registry", status = %response.status(), "registry token assigned");
        Ok(())
    }
}
