//! Handler-side authorization helpers.

use bizdir_auth::{Capability, require};
use bizdir_core::UserId;
use bizdir_registry::Viewer;

use crate::app::errors::ApiError;
use crate::context::AuthContext;

pub fn require_admin(ctx: &AuthContext) -> Result<(), ApiError> {
    Ok(require(ctx.identity(), &Capability::Admin)?)
}

pub fn require_self_or_admin(ctx: &AuthContext, subject: UserId) -> Result<(), ApiError> {
    Ok(require(ctx.identity(), &Capability::SelfOrAdmin(subject))?)
}

/// How a possibly anonymous caller sees business listings.
pub fn viewer(ctx: Option<&AuthContext>) -> Viewer {
    match ctx {
        None => Viewer::Anonymous,
        Some(ctx) if ctx.is_admin() => Viewer::Admin(ctx.user_id()),
        Some(ctx) => Viewer::User(ctx.user_id()),
    }
}
