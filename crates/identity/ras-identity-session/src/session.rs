//! Session map and the store that moves it in and out of the cookie jar.

use crate::cookie::CookieSlot;
use crate::{SessionConfig, SessionResult};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Session key holding the provider's access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Per-browser key/value session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    values: BTreeMap<String, serde_json::Value>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.get(ACCESS_TOKEN_KEY).and_then(|v| v.as_str())
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.insert(ACCESS_TOKEN_KEY, token.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What was found in the request's cookie jar.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionLoad {
    /// No cookie, or one that failed to decrypt
    Missing,
    Found(Session),
    /// The cookie decrypted but held something other than a session
    Reset,
}

impl SessionLoad {
    pub fn into_session(self) -> Session {
        match self {
            SessionLoad::Found(session) => session,
            SessionLoad::Missing | SessionLoad::Reset => Session::new(),
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    slot: CookieSlot<Session>,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            slot: CookieSlot::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cookie_name(&self) -> &str {
        self.slot.name()
    }

    pub fn inspect(&self, jar: &PrivateCookieJar) -> SessionLoad {
        match self.slot.read(jar) {
            Ok(Some(session)) => SessionLoad::Found(session),
            Ok(None) => SessionLoad::Missing,
            Err(e) => {
                warn!(cookie = %self.slot.name(), error = %e, "Discarding unreadable session");
                SessionLoad::Reset
            }
        }
    }

    /// Load the session, queueing removal of the cookie if it had to be reset.
    pub fn load(&self, jar: PrivateCookieJar) -> (Session, PrivateCookieJar) {
        match self.inspect(&jar) {
            SessionLoad::Reset => (Session::new(), self.slot.clear(jar)),
            load => (load.into_session(), jar),
        }
    }

    pub fn save(&self, jar: PrivateCookieJar, session: &Session) -> SessionResult<PrivateCookieJar> {
        self.slot.write(jar, session)
    }

    pub fn clear(&self, jar: PrivateCookieJar) -> PrivateCookieJar {
        self.slot.clear(jar)
    }
}
