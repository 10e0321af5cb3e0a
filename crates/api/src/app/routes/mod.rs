use axum::{Router, routing::post};

use crate::middleware::{self, AuthState};

pub mod admin;
pub mod auth;
pub mod businesses;
pub mod system;
pub mod users;

/// Every endpoint except `/health`.
///
/// Bearer authentication runs only on routes that read the caller; the
/// `/auth` endpoints and the public directory listing ignore the
/// `Authorization` header entirely.
pub fn router(auth_state: AuthState) -> Router {
    let authenticate = || axum::middleware::from_fn_with_state(auth_state.clone(), middleware::authenticate);

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .nest("/users", users::router().route_layer(authenticate()))
        .nest("/businesses", businesses::router(auth_state.clone()))
        .nest("/admin", admin::router().route_layer(authenticate()))
}

/// Parse a path id, reporting garbage as 400.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, crate::app::errors::ApiError>
where
    T: core::str::FromStr<Err = bizdir_core::DomainError>,
{
    Ok(raw.parse::<T>()?)
}

