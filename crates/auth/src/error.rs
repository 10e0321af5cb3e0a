use thiserror::Error;

use bizdir_core::{DomainError, StoreError};

use crate::{AuthzError, ProviderError, TokenValidationError};

/// Failure of an authentication, registration or authorization step.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// No usable credential was presented, or it names a user that no longer exists.
    #[error("{0}")]
    Unauthenticated(String),

    /// The presented session/provider token failed verification.
    #[error("{0}")]
    InvalidToken(String),

    /// No user is registered under the presented email.
    #[error("user not found")]
    UnknownUser,

    /// The password (or provider credential) did not match.
    #[error("invalid credential")]
    InvalidCredential,

    /// Authenticated but lacking the required capability.
    #[error("{0}")]
    Forbidden(String),

    /// A unique constraint rejected the write (duplicate email).
    #[error("{0}")]
    Conflict(String),

    /// The external identity provider could not be reached.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Unexpected failure (storage, hashing, signing).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<DomainError> for AuthError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::NotFound => Self::UnknownUser,
            DomainError::InvariantViolation(msg) => Self::Internal(msg),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => Self::Conflict("User already exists".to_string()),
            StoreError::NotFound => Self::UnknownUser,
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<AuthzError> for AuthError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(msg) => Self::Forbidden(msg),
        }
    }
}

impl From<TokenValidationError> for AuthError {
    fn from(err: TokenValidationError) -> Self {
        Self::InvalidToken(err.to_string())
    }
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rejected(_) => Self::InvalidCredential,
            ProviderError::Conflict(_) => Self::Conflict("User already exists".to_string()),
            ProviderError::Unavailable(msg) => Self::ProviderUnavailable(msg),
        }
    }
}
