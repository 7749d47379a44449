//! OIDC error types.

use ras_identity_core::IdentityError;
use thiserror::Error;

pub type OidcResult<T> = Result<T, OidcError>;

#[derive(Debug, Error)]
pub enum OidcError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Provider discovery failed: {0}")]
    DiscoveryFailed(String),

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("State not found or expired")]
    StateExpired,

    #[error("Provider mismatch: expected {expected}, got {actual}")]
    ProviderMismatch { expected: String, actual: String },

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),

    #[error("User info request failed: {0}")]
    UserInfoFailed(String),

    #[error("Invalid user info response: {0}")]
    InvalidUserInfoResponse(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JWT decoding error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Callback error: {0}")]
    CallbackError(String),
}

impl From<OidcError> for IdentityError {
    fn from(err: OidcError) -> Self {
        match err {
            OidcError::InvalidState => IdentityError::InvalidState,
            OidcError::StateExpired => IdentityError::StateExpired,
            OidcError::MissingAuthorizationCode => IdentityError::MissingAuthorizationCode,
            OidcError::ProviderMismatch { expected, actual } => {
                IdentityError::ProviderMismatch { expected, actual }
            }
            OidcError::CallbackError(message) => IdentityError::CallbackError(message),
            err @ (OidcError::HttpError(_)
            | OidcError::TokenExchangeFailed(_)
            | OidcError::InvalidTokenResponse(_)
            | OidcError::InvalidIdToken(_)
            | OidcError::JwtError(_)
            | OidcError::UserInfoFailed(_)
            | OidcError::InvalidUserInfoResponse(_)) => {
                IdentityError::ExchangeFailed(err.to_string())
            }
            other => IdentityError::ProviderError(other.to_string()),
        }
    }
}
