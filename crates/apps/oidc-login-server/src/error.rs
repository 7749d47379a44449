use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ras_identity_core::IdentityError;
use ras_identity_session::SessionError;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

/// Per-request failures of the login flow.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Could not start authorization: {0}")]
    Authorization(#[source] IdentityError),

    #[error("{0}")]
    Exchange(#[source] IdentityError),

    #[error("Missing or unreadable authorization state")]
    MissingCorrelation,

    #[error("Invalid callback query: {0}")]
    InvalidCallback(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::UnknownProvider(_)
            | AppError::Authorization(_)
            | AppError::Exchange(_)
            | AppError::MissingCorrelation
            | AppError::InvalidCallback(_) => {
                warn!(error = %self, "Authentication flow failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Session(e) => {
                error!(error = %e, "Session could not be written");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Timeout(after) => {
                warn!(timeout = ?after, "Upstream call timed out");
                (StatusCode::GATEWAY_TIMEOUT, "Gateway timeout".to_string())
            }
        };

        (status, message).into_response()
    }
}
