//! Cookie-backed session storage.
//!
//! A session is a small string-keyed map that lives entirely inside one
//! private cookie: the payload is encrypted and authenticated with a key
//! derived from the configured secret, and the server keeps no copy. A
//! cookie that cannot be decrypted or decoded is treated as "no session"
//! rather than as a failure.

use chrono::Duration;
use sha2::{Digest, Sha512};
use thiserror::Error;

mod cookie;
mod session;

pub use cookie::CookieSlot;
pub use session::{ACCESS_TOKEN_KEY, Session, SessionLoad, SessionStore};

// Re-export the jar types so callers do not need a direct axum-extra dependency
pub use axum_extra::extract::cookie::{Key, PrivateCookieJar, SameSite};

/// Default session cookie name
pub const SESSION_COOKIE_NAME: &str = "auth";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session secret: {0}")]
    InvalidSecret(String),

    #[error("Session payload could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Session payload could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub max_age: Duration,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: SESSION_COOKIE_NAME.to_string(),
            max_age: Duration::hours(24),
            secure: false,
            same_site: SameSite::Lax,
            path: "/".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

/// Derive the 64-byte cookie key from an arbitrary-length secret.
pub fn derive_key(secret: &str) -> SessionResult<Key> {
    if secret.is_empty() {
        return Err(SessionError::InvalidSecret("secret is empty".to_string()));
    }

    let digest = Sha512::digest(secret.as_bytes());
    Key::try_from(&digest[..]).map_err(|e| SessionError::InvalidSecret(format!("{:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation_is_deterministic() {
        let a = derive_key("session-secret").unwrap();
        let b = derive_key("session-secret").unwrap();
        let c = derive_key("other-secret").unwrap();

        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(
            derive_key(""),
            Err(SessionError::InvalidSecret(_))
        ));
    }
}
