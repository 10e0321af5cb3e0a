//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, verifier, authenticator and session issuer
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs, the response envelope, JSON extraction
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: AppServices, cors_origin: Option<HeaderValue>) -> Router {
    let auth_state = middleware::AuthState {
        authenticator: services.authenticator.clone(),
    };
    let services = Arc::new(services);

    let api = routes::router(auth_state).layer(Extension(services));

    let router = Router::new()
        .route("/health", get(routes::system::health))
        .merge(api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    match cors_origin {
        Some(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        ),
        None => router,
    }
}
