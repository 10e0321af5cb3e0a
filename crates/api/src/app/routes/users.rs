//! User profile routes.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
};

use bizdir_auth::{User, UserProfile, UserUpdate, require_role_change, user::validate_name};
use bizdir_core::UserId;

use crate::app::dto::{self, ApiJson, UpdateUserRequest};
use crate::app::errors::ApiError;
use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(me))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// GET /users (admin)
pub async fn list_users(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require_admin(&ctx)?;
    Ok(dto::ok(all_profiles(&services).await?))
}

/// GET /users/me
pub async fn me(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(dto::ok(load_user(&services, ctx.user_id()).await?.profile()))
}

/// GET /users/:id
pub async fn get_user(
    _ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: UserId = parse_id(&id)?;
    Ok(dto::ok(load_user(&services, id).await?.profile()))
}

/// PUT /users/:id (self or admin; role changes admin only)
pub async fn update_user(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id: UserId = parse_id(&id)?;
    authz::require_self_or_admin(&ctx, id)?;
    let user = apply_update(&services, &ctx, id, body).await?;
    Ok(dto::ok_with_message("User updated", user.profile()))
}

/// DELETE /users/:id (admin)
pub async fn delete_user(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require_admin(&ctx)?;
    let id: UserId = parse_id(&id)?;
    remove_user(&services, &ctx, id).await?;
    Ok(dto::message("User deleted successfully"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared with the admin routes
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) async fn all_profiles(services: &AppServices) -> Result<Vec<UserProfile>, ApiError> {
    Ok(services.users.list_users().await?.iter().map(User::profile).collect())
}

pub(crate) async fn load_user(services: &AppServices, id: UserId) -> Result<User, ApiError> {
    services
        .users
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub(crate) async fn apply_update(
    services: &AppServices,
    ctx: &AuthContext,
    id: UserId,
    body: UpdateUserRequest,
) -> Result<User, ApiError> {
    let current = load_user(services, id).await?;
    require_role_change(ctx.identity(), current.role, body.role)?;

    let update = UserUpdate {
        name: body.name.as_deref().map(validate_name).transpose()?,
        role: body.role,
    };
    if update.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    let updated = services
        .users
        .update_user(id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if updated.role != current.role {
        tracing::info!(
            user_id = %updated.id,
            actor_id = %ctx.user_id(),
            from = %current.role,
            to = %updated.role,
            "user role changed"
        );
    }
    Ok(updated)
}

pub(crate) async fn remove_user(
    services: &AppServices,
    ctx: &AuthContext,
    id: UserId,
) -> Result<(), ApiError> {
    if !services.users.delete_user(id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    tracing::info!(user_id = %id, actor_id = %ctx.user_id(), "user deleted");
    Ok(())
}
