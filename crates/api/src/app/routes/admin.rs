//! Admin routes for user and listing moderation.
//!
//! The whole tree sits behind the admin gate in `middleware::require_admin`;
//! handlers still take the [`AuthContext`] for audit logging.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    Json,
    response::IntoResponse,
    routing::{delete, get, patch},
};

use bizdir_auth::{Registration, RegistrationSecret};
use bizdir_core::{BusinessId, UserId};
use bizdir_registry::{Business, StatusChange};

use crate::app::dto::{
    self, ApiJson, CreateUserRequest, Envelope, RejectBusinessRequest, UpdateUserRequest, present,
};
use crate::app::errors::ApiError;
use crate::app::routes::{parse_id, users};
use crate::app::services::AppServices;
use crate::context::AuthContext;
use crate::middleware;

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/businesses", get(list_businesses))
        .route("/businesses/:id", delete(delete_business))
        .route("/businesses/:id/approve", patch(approve_business))
        .route("/businesses/:id/reject", patch(reject_business))
        .route_layer(axum::middleware::from_fn(middleware::require_admin))
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// GET /admin/users
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(dto::ok(users::all_profiles(&services).await?))
}

/// GET /admin/users/:id
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: UserId = parse_id(&id)?;
    Ok(dto::ok(users::load_user(&services, id).await?.profile()))
}

/// POST /admin/users
///
/// Creates the account through the configured verifier with the requested
/// role already set; there is no follow-up write.
pub async fn create_user(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(name), Some(email), Some(password)) =
        (present(&body.name), present(&body.email), body.password.as_deref())
    else {
        return Err(ApiError::BadRequest("Name, email, and password are required".to_string()));
    };

    let user = services
        .verifier
        .register(
            Registration::new(name, email, RegistrationSecret::Password(password.to_string()))
                .with_role(body.role.unwrap_or_default()),
        )
        .await?;

    tracing::info!(
        user_id = %user.id,
        actor_id = %ctx.user_id(),
        role = %user.role,
        "user created by admin"
    );
    Ok(dto::created("User created", user.profile()))
}

/// PUT /admin/users/:id
pub async fn update_user(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id: UserId = parse_id(&id)?;
    let user = users::apply_update(&services, &ctx, id, body).await?;
    Ok(dto::ok_with_message("User updated", user.profile()))
}

/// DELETE /admin/users/:id
pub async fn delete_user(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: UserId = parse_id(&id)?;
    users::remove_user(&services, &ctx, id).await?;
    Ok(dto::message("User deleted successfully"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Businesses
// ─────────────────────────────────────────────────────────────────────────────

/// GET /admin/businesses (all statuses, with owner names)
pub async fn list_businesses(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(dto::ok(services.businesses.list_businesses_with_owners().await?))
}

/// PATCH /admin/businesses/:id/approve
pub async fn approve_business(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: BusinessId = parse_id(&id)?;
    change_status(&services, &ctx, id, StatusChange::Approve, "Business approved").await
}

/// PATCH /admin/businesses/:id/reject
pub async fn reject_business(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Option<ApiJson<RejectBusinessRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let id: BusinessId = parse_id(&id)?;
    let reason = body.and_then(|ApiJson(b)| b.reason);
    let change = StatusChange::reject(reason.as_deref())
        .map_err(|_| ApiError::BadRequest("Rejection reason is required".to_string()))?;
    change_status(&services, &ctx, id, change, "Business rejected").await
}

async fn change_status(
    services: &AppServices,
    ctx: &AuthContext,
    id: BusinessId,
    change: StatusChange,
    message: &str,
) -> Result<Json<Envelope<Business>>, ApiError> {
    let business = services
        .businesses
        .update_business_status(id, change)
        .await?
        .ok_or_else(|| ApiError::NotFound("Business not found".to_string()))?;

    tracing::info!(
        business_id = %business.id,
        actor_id = %ctx.user_id(),
        status = %business.status,
        reason = business.rejection_reason.as_deref().unwrap_or_default(),
        "business status changed"
    );
    Ok(dto::ok_with_message(message, business))
}

/// DELETE /admin/businesses/:id
pub async fn delete_business(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: BusinessId = parse_id(&id)?;
    if !services.businesses.delete_business(id).await? {
        return Err(ApiError::NotFound("Business not found".to_string()));
    }
    tracing::info!(business_id = %id, actor_id = %ctx.user_id(), "business deleted");
    Ok(dto::message("Business deleted successfully"))
}
