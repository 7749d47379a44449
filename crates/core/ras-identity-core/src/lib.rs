//! Core identity provider traits and types.
//!
//! An [`AuthorizationProvider`] is the capability that knows how to send a
//! browser to an external identity provider and how to finish the
//! authorization-code exchange when the browser comes back. Providers are
//! registered once at startup in a [`ProviderRegistry`] and looked up by the
//! identifier found in the request path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod correlation;
mod registry;

pub use correlation::CorrelationState;
pub use registry::ProviderRegistry;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Provider mismatch: expected {expected}, got {actual}")]
    ProviderMismatch { expected: String, actual: String },

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("Authorization state expired")]
    StateExpired,

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Authorization denied by provider: {0}")]
    CallbackError(String),

    #[error("Code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity details reported by the provider for the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub provider_id: String,
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Where to send the browser to start an authorization, plus the state that
/// has to survive the round trip.
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    pub url: String,
    pub correlation: CorrelationState,
}

/// Query parameters the identity provider attaches to the callback redirect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Outcome of a completed authorization-code exchange.
///
/// Lives only for the duration of the callback request.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub identity: VerifiedIdentity,
}

#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Build the redirect to the provider's authorization endpoint.
    async fn begin_auth(&self) -> IdentityResult<AuthorizationRedirect>;

    /// Exchange the callback's authorization code for tokens.
    ///
    /// `correlation` is the state produced by [`Self::begin_auth`] for this
    /// browser; implementations must reject callbacks that do not match it.
    async fn complete_auth(
        &self,
        correlation: &CorrelationState,
        callback: CallbackParams,
    ) -> IdentityResult<AuthResult>;
}
