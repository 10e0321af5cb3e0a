use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use bizdir_auth::Identity;
use bizdir_core::UserId;

use crate::app::errors::ApiError;

/// Authenticated identity for a request.
///
/// Inserted into request extensions by the authentication middleware. As an
/// extractor it rejects with 401 when the request carried no bearer token;
/// use `Option<AuthContext>` on routes that also serve anonymous callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    identity: Identity,
}

impl AuthContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user_id(&self) -> UserId {
        self.identity.id
    }

    pub fn is_admin(&self) -> bool {
        self.identity.is_admin()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))
    }
}
