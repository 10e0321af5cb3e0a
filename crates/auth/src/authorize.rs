//! Authorization guard.
//!
//! Pure policy checks: no IO, no panics.

use thiserror::Error;

use bizdir_core::UserId;

use crate::{Identity, Role};

/// Something an identity may be required to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Administrator only.
    Admin,
    /// The owner of the addressed resource, or an administrator.
    SelfOrAdmin(UserId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Check that `identity` holds `capability`.
pub fn require(identity: &Identity, capability: &Capability) -> Result<(), AuthzError> {
    match capability {
        Capability::Admin if identity.is_admin() => Ok(()),
        Capability::Admin => Err(AuthzError::Forbidden("Admin access required".to_string())),
        Capability::SelfOrAdmin(owner) if identity.id == *owner || identity.is_admin() => Ok(()),
        Capability::SelfOrAdmin(_) => Err(AuthzError::Forbidden("Access denied".to_string())),
    }
}

/// Guard a role change requested by `actor` on a subject currently holding `current`.
///
/// Only administrators may change a role. Re-sending the subject's current
/// role is a no-op and therefore allowed for anyone who may edit the record.
pub fn require_role_change(
    actor: &Identity,
    current: Role,
    requested: Option<Role>,
) -> Result<(), AuthzError> {
    match requested {
        Some(role) if role != current && !actor.is_admin() => Err(AuthzError::Forbidden(format!(
            "cannot change role to '{role}' without admin access"
        ))),
        _ => Ok(()),
    }
}
