//! Authentication and login errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use codejam_common::RepositoryError;
use serde_json::json;

use crate::store::SessionStoreError;

/// Rejection from the session extractors
#[derive(Debug)]
pub enum AuthError {
    NotAuthenticated,
    /// Cookie layer missing from the router
    SessionUnavailable,
    SessionLoadError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                "NOT_AUTHENTICATED",
                "Login required",
            ),
            AuthError::SessionUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SESSION_UNAVAILABLE",
                "Session handling is not configured",
            ),
            AuthError::SessionLoadError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SESSION_LOAD_ERROR",
                "Failed to load session",
            ),
        };

        error_body(status, code, message)
    }
}

/// Failures of the OAuth login handshake
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Missing State Value")]
    MissingState,

    #[error("Invalid State Data")]
    InvalidState,

    #[error("Missing authorization code")]
    MissingCode,

    #[error("Authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Identity lookup failed: {0}")]
    IdentityLookupFailed(String),

    #[error("Debug login is disabled")]
    DebugLoginDisabled,

    #[error(transparent)]
    Session(#[from] SessionStoreError),

    #[error("Failed to record account: {0}")]
    Account(#[from] RepositoryError),

    #[error("Internal login error: {0}")]
    Internal(String),
}

impl LoginError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LoginError::MissingState | LoginError::InvalidState | LoginError::MissingCode => {
                StatusCode::BAD_REQUEST
            }
            LoginError::ExchangeFailed(_) | LoginError::IdentityLookupFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            LoginError::DebugLoginDisabled => StatusCode::NOT_FOUND,
            LoginError::Session(_) | LoginError::Account(_) | LoginError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            LoginError::MissingState => "MISSING_STATE",
            LoginError::InvalidState => "INVALID_STATE",
            LoginError::MissingCode => "MISSING_CODE",
            LoginError::ExchangeFailed(_) => "EXCHANGE_FAILED",
            LoginError::IdentityLookupFailed(_) => "IDENTITY_LOOKUP_FAILED",
            LoginError::DebugLoginDisabled => "NOT_FOUND",
            LoginError::Session(_) => "SESSION_ERROR",
            LoginError::Account(_) => "ACCOUNT_ERROR",
            LoginError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match status {
            StatusCode::BAD_GATEWAY => {
                tracing::warn!(error = %self, "Login aborted by identity provider failure");
                "Identity provider request failed".to_string()
            }
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %self, "Login failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        error_body(status, self.error_code(), &message)
    }
}

fn error_body(status: StatusCode, code: &str, message: &str) -> Response {
    let body = Json(json!({
        "error": {
            "code": code,
            "message": message,
        }
    }));

    (status, body).into_response()
}
