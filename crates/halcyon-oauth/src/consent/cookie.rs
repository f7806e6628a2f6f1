//! Server-signed consent session cookie.
//!
//! The cookie stores the anti-replay nonce as `{nonce}.{hmac}` where the
//! HMAC-SHA256 signature covers the nonce. A missing, malformed or forged
//! cookie decodes to an empty cookie, which can never match a challenge
//! nonce.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the consent session nonce.
pub const CONSENT_COOKIE_NAME: &str = "consent_session";

/// Cookie lifetime in seconds. Much longer than the challenge replay
/// window; the nonce comparison is what gates validation.
const CONSENT_COOKIE_MAX_AGE: i64 = 3600;

/// Nonce length in bytes before encoding.
const NONCE_LENGTH: usize = 32;

/// The browser-held half of the consent CSRF defense.
#[derive(Debug, Clone, Default)]
pub struct ConsentCookie {
    nonce: Option<String>,
}

impl ConsentCookie {
    /// Decode the consent cookie from request headers, verifying its
    /// signature with `key`. Absent or forged cookies yield an empty
    /// cookie rather than an error.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, key: &[u8]) -> Self {
        let Some(value) = extract_cookie_value(headers) else {
            return Self::default();
        };

        let Some((nonce, signature)) = value.rsplit_once('.') else {
            return Self::default();
        };

        let expected = compute_hmac(key, nonce);
        if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
            return Self::default();
        }

        Self {
            nonce: Some(nonce.to_string()),
        }
    }

    /// The current nonce, if one is set.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    /// Install a fresh nonce, discarding any previous one. Called when a
    /// challenge is issued and again after a successful validation, so a
    /// consent response is consumable exactly once.
    pub fn rotate_nonce(&mut self) -> &str {
        let mut bytes = [0u8; NONCE_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        self.nonce = Some(URL_SAFE_NO_PAD.encode(bytes));
        self.nonce.as_deref().unwrap_or_default()
    }

    /// Constant-time comparison of a candidate nonce against the cookie.
    /// False when the cookie carries no nonce.
    #[must_use]
    pub fn matches_nonce(&self, candidate: &str) -> bool {
        match &self.nonce {
            Some(nonce) => constant_time_eq(nonce.as_bytes(), candidate.as_bytes()),
            None => false,
        }
    }

    /// Build the `Set-Cookie` header value persisting this cookie.
    ///
    /// `SameSite=Lax` so the cookie survives the top-level redirect back
    /// from the consent provider. `Secure` unless the deployment forces
    /// plain HTTP.
    #[must_use]
    pub fn to_set_cookie(&self, key: &[u8], secure: bool) -> String {
        let secure_flag = if secure { "; Secure" } else { "" };
        match &self.nonce {
            Some(nonce) => {
                let signature = compute_hmac(key, nonce);
                format!(
                    "{CONSENT_COOKIE_NAME}={nonce}.{signature}; HttpOnly{secure_flag}; SameSite=Lax; Path=/oauth2; Max-Age={CONSENT_COOKIE_MAX_AGE}"
                )
            }
            None => format!(
                "{CONSENT_COOKIE_NAME}=; HttpOnly{secure_flag}; SameSite=Lax; Path=/oauth2; Max-Age=0"
            ),
        }
    }
}

/// Extract the raw consent cookie value from the `Cookie` header.
fn extract_cookie_value(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for part in cookie_str.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(&format!("{CONSENT_COOKIE_NAME}=")) {
            return Some(value.trim().to_string());
        }
    }

    None
}

/// HMAC-SHA256 of `data`, hex-encoded.
fn compute_hmac(key: &[u8], data: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}
