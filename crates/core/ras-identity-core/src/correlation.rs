//! Correlation state carried across the authorization redirect.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State generated when an authorization starts and checked when the
/// provider redirects back.
///
/// The `state` value is sent to the provider and echoed back on the
/// callback; the remaining fields never leave the server except inside an
/// encrypted cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationState {
    pub state: String,
    pub provider_id: String,
    pub redirect_uri: String,
    pub code_verifier: Option<String>,
    pub nonce: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CorrelationState {
    pub fn new(
        provider_id: String,
        redirect_uri: String,
        code_verifier: Option<String>,
        nonce: Option<String>,
        ttl_seconds: u64,
    ) -> Self {
        let state = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        // Saturate instead of overflowing on absurd TTLs
        let expires_at = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            state,
            provider_id,
            redirect_uri,
            code_verifier,
            nonce,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_ttl_saturates() {
        let state = CorrelationState::new(
            "openid-connect".to_string(),
            "http://localhost:3000/callback".to_string(),
            None,
            None,
            u64::MAX,
        );
        assert_eq!(state.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!state.is_expired());
    }

    #[test]
    fn test_new_state_is_unique_and_live() {
        let first = CorrelationState::new(
            "openid-connect".to_string(),
            "http://localhost:3000/auth/openid-connect/callback".to_string(),
            Some("verifier".to_string()),
            Some("nonce".to_string()),
            600,
        );
        let second = CorrelationState::new(
            "openid-connect".to_string(),
            "http://localhost:3000/auth/openid-connect/callback".to_string(),
            None,
            None,
            600,
        );

        assert_ne!(first.state, second.state);
        assert_eq!(first.state.len(), 36);
        assert!(!first.is_expired());
        assert_eq!(first.expires_at - first.created_at, Duration::seconds(600));
    }

    #[test]
    fn test_expired_state() {
        let mut state = CorrelationState::new(
            "openid-connect".to_string(),
            "http://localhost:3000/callback".to_string(),
            None,
            None,
            600,
        );
        state.expires_at = Utc::now() - Duration::minutes(1);

        assert!(state.is_expired());
    }

    #[test]
    fn test_survives_json_round_trip() {
        let state = CorrelationState::new(
            "demo".to_string(),
            "http://localhost:3000/auth/demo/callback".to_string(),
            Some("verifier".to_string()),
            Some("nonce".to_string()),
            60,
        );

        let encoded = serde_json::to_string(&state).unwrap();
        let decoded: CorrelationState = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, state);
    }
}
