//! Application configuration loaded from environment variables.
//!
//! Fail-fast loading with validation: required variables must be present
//! and valid, or the application exits with a clear error message.
//! Production mode refuses to start on the insecure development cookie
//! key.

use std::env;

use chrono::Duration;
use thiserror::Error;
use url::Url;

use halcyon_oauth::{ConfigError as CoreConfigError, OAuthConfig, TokenRegistryConfig};

/// Development-only cookie key: 64 hex '0' characters.
pub const INSECURE_COOKIE_KEY: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Application environment mode.
///
/// Controls security enforcement:
/// - `Development`: the insecure default cookie key is allowed with
///   WARN-level logging.
/// - `Production`: the insecure default causes the application to refuse
///   startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    /// Parse from the `APP_ENV` environment variable value. Defaults to
    /// `Development` if unset or unrecognized.
    pub fn from_env_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }
}

impl std::fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("HALCYON_COOKIE_KEY is the insecure development default; refusing to start in production")]
    InsecureCookieKey,

    #[error(transparent)]
    Core(#[from] CoreConfigError),
}

/// Fully loaded application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_env: AppEnvironment,
    pub bind_addr: String,
    pub rust_log: String,
    pub oauth: OAuthConfig,
    pub registry: TokenRegistryConfig,
}

impl AppConfig {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, AppConfigError> {
        let app_env = AppEnvironment::from_env_str(&var_or("APP_ENV", "development"));
        let bind_addr = var_or("HALCYON_BIND_ADDR", "0.0.0.0:4444");
        let rust_log = var_or("RUST_LOG", "info");

        let issuer = required("HALCYON_ISSUER")?;
        let consent_url = required("HALCYON_CONSENT_URL")?;
        let consent_url = Url::parse(&consent_url).map_err(|e| AppConfigError::Invalid {
            name: "HALCYON_CONSENT_URL",
            reason: e.to_string(),
        })?;

        let cookie_key_hex = var_or("HALCYON_COOKIE_KEY", INSECURE_COOKIE_KEY);
        if cookie_key_hex == INSECURE_COOKIE_KEY {
            if app_env.is_production() {
                return Err(AppConfigError::InsecureCookieKey);
            }
            tracing::warn!("using the insecure development cookie key");
        }
        let cookie_key = hex::decode(&cookie_key_hex).map_err(|e| AppConfigError::Invalid {
            name: "HALCYON_COOKIE_KEY",
            reason: e.to_string(),
        })?;

        let access_token_lifespan =
            Duration::seconds(int_or("HALCYON_ACCESS_TOKEN_LIFESPAN_SECS", 3600)?);
        let challenge_lifespan = int_or("HALCYON_CHALLENGE_LIFESPAN_SECS", 10)?;
        let forced_http = bool_or("HALCYON_FORCED_HTTP", false)?;

        let oauth = OAuthConfig::new(issuer, consent_url, access_token_lifespan, cookie_key)?
            .with_forced_http(forced_http)
            .with_challenge_lifespan(Duration::seconds(challenge_lifespan))?;

        let root_ca_pem = match env::var("HALCYON_REGISTRY_CA_FILE") {
            Ok(path) => Some(std::fs::read(&path).map_err(|e| AppConfigError::Invalid {
                name: "HALCYON_REGISTRY_CA_FILE",
                reason: e.to_string(),
            })?),
            Err(_) => None,
        };
        let registry = TokenRegistryConfig {
            token_url: env::var("HALCYON_REGISTRY_TOKEN_URL").ok(),
            assignment_url: env::var("HALCYON_REGISTRY_ASSIGNMENT_URL").ok(),
            bearer_token: env::var("HALCYON_REGISTRY_BEARER_TOKEN").ok(),
            root_ca_pem,
        };

        Ok(Self {
            app_env,
            bind_addr,
            rust_log,
            oauth,
            registry,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required(name: &'static str) -> Result<String, AppConfigError> {
    env::var(name).map_err(|_| AppConfigError::Missing(name))
}

fn int_or(name: &'static str, default: i64) -> Result<i64, AppConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| AppConfigError::Invalid {
            name,
            reason: format!("expected an integer, got {value:?}"),
        }),
        Err(_) => Ok(default),
    }
}

fn bool_or(name: &'static str, default: bool) -> Result<bool, AppConfigError> {
    match env::var(name) {
        Ok(value) => match value.to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(AppConfigError::Invalid {
                name,
                reason: format!("expected true or false, got {other:?}"),
            }),
        },
        Err(_) => Ok(default),
    }
}
