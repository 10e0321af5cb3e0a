//! Public and owner-facing business listing routes.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
};

use bizdir_core::BusinessId;
use bizdir_registry::NewBusiness;

use crate::app::dto::{self, ApiJson, CreateBusinessRequest};
use crate::app::errors::ApiError;
use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::AuthContext;
use crate::middleware::{self, AuthState};

/// The listing `GET /` is public and skips authentication; every other
/// method here resolves the bearer token, if one is sent.
pub fn router(auth_state: AuthState) -> Router {
    let authenticate = axum::middleware::from_fn_with_state(auth_state, middleware::authenticate);

    Router::new()
        .route(
            "/",
            get(list_businesses).merge(post(create_business).route_layer(authenticate.clone())),
        )
        .route("/my-businesses", get(my_businesses).route_layer(authenticate.clone()))
        .route("/:id", get(get_business).route_layer(authenticate))
}

/// GET /businesses (approved only)
pub async fn list_businesses(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(dto::ok(services.businesses.list_approved_businesses().await?))
}

/// POST /businesses (anonymous or authenticated)
pub async fn create_business(
    ctx: Option<AuthContext>,
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CreateBusinessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = ctx.as_ref().map(AuthContext::user_id);
    let name = body.name.as_deref().unwrap_or_default();
    let business = services
        .businesses
        .create_business(NewBusiness::new(owner, name, body.description.as_deref())?)
        .await?;

    tracing::info!(
        business_id = %business.id,
        owner_id = ?business.owner_id,
        "business submitted"
    );
    Ok(dto::created("Business submitted for review", business))
}

/// GET /businesses/my-businesses
pub async fn my_businesses(
    ctx: AuthContext,
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(dto::ok(
        services.businesses.list_businesses_by_owner(ctx.user_id()).await?,
    ))
}

/// GET /businesses/:id
///
/// Listings the caller may not see are reported as missing.
pub async fn get_business(
    ctx: Option<AuthContext>,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: BusinessId = parse_id(&id)?;
    let viewer = authz::viewer(ctx.as_ref());
    services
        .businesses
        .find_business(id)
        .await?
        .filter(|b| b.is_visible_to(&viewer))
        .map(dto::ok)
        .ok_or_else(|| ApiError::NotFound("Business not found".to_string()))
}
