//! Consistent error responses.
//!
//! Every failure leaves the API as `{ "success": false, "message": ... }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use bizdir_auth::{AuthError, AuthzError};
use bizdir_core::{DomainError, StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate email. Reported as 400 to match what clients already expect.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    /// Details are logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                json_error(status, "Internal server error")
            }
            ApiError::Unavailable(detail) => {
                tracing::warn!(%detail, "upstream unavailable");
                json_error(status, "Identity provider unavailable")
            }
            other => json_error(status, other.to_string()),
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "message": message.into(),
        })),
    )
        .into_response()
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError::BadRequest(msg),
            AuthError::Unauthenticated(msg) | AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            AuthError::UnknownUser | AuthError::InvalidCredential => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            AuthError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthError::Conflict(msg) => ApiError::Conflict(msg),
            AuthError::ProviderUnavailable(msg) => ApiError::Unavailable(msg),
            AuthError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(msg) => ApiError::Forbidden(msg),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::BadRequest(msg),
            DomainError::NotFound => ApiError::NotFound("Not found".to_string()),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::InvariantViolation(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => ApiError::Conflict("User already exists".to_string()),
            StoreError::NotFound => ApiError::NotFound("Not found".to_string()),
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_failures_share_one_message() {
        for err in [AuthError::UnknownUser, AuthError::InvalidCredential] {
            let api = ApiError::from(err);
            assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(api.to_string(), "Invalid email or password");
        }
    }

    #[test]
    fn conflicts_are_bad_requests() {
        let api = ApiError::from(StoreError::Conflict("users_email_key".into()));
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.to_string(), "User already exists");
    }

    #[test]
    fn provider_outage_is_503() {
        let api = ApiError::from(AuthError::ProviderUnavailable("timeout".into()));
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
