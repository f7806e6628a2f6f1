//! Construction-time configuration for the protocol core.

use chrono::Duration;
use thiserror::Error;
use url::Url;

/// Minimum cookie-signing key length in bytes.
const MIN_COOKIE_KEY_LENGTH: usize = 32;

/// Default replay window for consent challenges.
const DEFAULT_CHALLENGE_LIFESPAN_SECS: i64 = 10;

/// Configuration validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cookie signing key must be at least {MIN_COOKIE_KEY_LENGTH} bytes, got {0}")]
    CookieKeyTooShort(usize),

    #[error("access token lifespan must be positive")]
    NonPositiveLifespan,

    #[error("challenge lifespan must be positive")]
    NonPositiveChallengeLifespan,
}

/// Settings consumed by the protocol core. Built explicitly by the
/// embedding application; the core never reads the process environment.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Issuer identifier, e.g. `https://idp.example.com`.
    pub issuer: String,

    /// Base URL of the external consent provider.
    pub consent_url: Url,

    /// Disable TLS-only assumptions: consent return URLs are built with
    /// plain `http` and cookies drop the `Secure` flag. A deployment-time
    /// risk for local development, not a protocol option.
    pub forced_http: bool,

    /// Default access token lifespan, also the introspection fallback
    /// when a session carries no explicit access-token expiry.
    pub access_token_lifespan: Duration,

    /// Replay window for consent challenges.
    pub challenge_lifespan: Duration,

    /// Key signing the consent session cookie and consent tokens.
    pub cookie_key: Vec<u8>,
}

impl OAuthConfig {
    /// Create a configuration with the default challenge replay window.
    pub fn new(
        issuer: impl Into<String>,
        consent_url: Url,
        access_token_lifespan: Duration,
        cookie_key: Vec<u8>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            issuer: issuer.into(),
            consent_url,
            forced_http: false,
            access_token_lifespan,
            challenge_lifespan: Duration::seconds(DEFAULT_CHALLENGE_LIFESPAN_SECS),
            cookie_key,
        };
        config.validate()?;
        Ok(config)
    }

    /// Allow plain-HTTP consent return URLs and cookies.
    #[must_use]
    pub fn with_forced_http(mut self, forced: bool) -> Self {
        self.forced_http = forced;
        self
    }

    /// Override the consent challenge replay window.
    pub fn with_challenge_lifespan(mut self, lifespan: Duration) -> Result<Self, ConfigError> {
        self.challenge_lifespan = lifespan;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cookie_key.len() < MIN_COOKIE_KEY_LENGTH {
            return Err(ConfigError::CookieKeyTooShort(self.cookie_key.len()));
        }
        if self.access_token_lifespan <= Duration::zero() {
            return Err(ConfigError::NonPositiveLifespan);
        }
        if self.challenge_lifespan <= Duration::zero() {
            return Err(ConfigError::NonPositiveChallengeLifespan);
        }
        Ok(())
    }
}
