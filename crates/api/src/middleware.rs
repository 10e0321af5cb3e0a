use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use bizdir_auth::{Capability, RequestAuthenticator, require};

use crate::app::errors::ApiError;
use crate::context::AuthContext;

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<dyn RequestAuthenticator>,
}

/// Resolve the bearer token, if any, into an [`AuthContext`].
///
/// No `Authorization` header lets the request through anonymously; a header
/// that is present but does not authenticate ends the request with 401.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_bearer(req.headers())? {
        let identity = state.authenticator.authenticate(token).await?;
        req.extensions_mut().insert(AuthContext::new(identity));
    }
    Ok(next.run(req).await)
}

/// Gate for the `/admin` tree; runs after [`authenticate`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let ctx = req
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;
    require(ctx.identity(), &Capability::Admin)?;
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?
        .trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized("No token provided".to_string()));
    }

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn absent_header_is_anonymous() {
        assert_eq!(extract_bearer(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")).unwrap(), Some("abc.def"));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(extract_bearer(&headers("Basic dXNlcjpwdw==")).is_err());
        assert!(extract_bearer(&headers("Bearer   ")).is_err());
    }
}
