//! Registration and login.

use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse};

use bizdir_auth::{Credentials, Registration, RegistrationSecret};

use crate::app::dto::{self, ApiJson, LoginRequest, LoginResponse, RegisterRequest, present};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// POST /auth/register
///
/// Accepts `{name, email, password}`; in delegated mode `{name, access_token}`
/// registers an identity the provider has already authenticated.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let secret = match (present(&body.access_token), present(&body.password)) {
        (Some(token), _) => RegistrationSecret::ProviderToken(token.to_string()),
        (None, Some(_)) if present(&body.email).is_some() => {
            RegistrationSecret::Password(body.password.clone().unwrap_or_default())
        }
        _ => return Err(ApiError::BadRequest("Name, email, and password are required".to_string())),
    };
    let Some(name) = present(&body.name) else {
        return Err(ApiError::BadRequest("Name, email, and password are required".to_string()));
    };

    let user = services
        .verifier
        .register(Registration::new(
            name,
            body.email.clone().unwrap_or_default(),
            secret,
        ))
        .await?;

    Ok(dto::created("User registered successfully", user.profile()))
}

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = match (present(&body.access_token), present(&body.email), &body.password) {
        (Some(token), _, _) => Credentials::ProviderToken(token.to_string()),
        (None, Some(email), Some(password)) if !password.is_empty() => Credentials::Password {
            email: email.to_string(),
            password: password.clone(),
        },
        _ => return Err(ApiError::BadRequest("Email and password are required".to_string())),
    };

    let user = match services.verifier.verify(credentials).await {
        Ok(user) => user,
        Err(err) => {
            tracing::info!(error = %err, "login rejected");
            return Err(err.into());
        }
    };
    let session = services.sessions.issue(&user)?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "login succeeded");
    Ok(dto::ok_with_message(
        "Login successful",
        LoginResponse {
            token: session.token,
            user: user.profile(),
        },
    ))
}
