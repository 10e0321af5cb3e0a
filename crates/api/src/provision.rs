//! Out-of-band admin provisioning, used by the `seed-admin` binary.

use bizdir_auth::{
    AuthError, Credential, CredentialStore, NewUser, Role, User, UserUpdate, normalize_email,
    password::{hash_password, validate_password},
};

/// How the seeded account proves its identity.
#[derive(Clone)]
pub enum SeedCredential {
    Password(String),
    /// Subject id at the external identity provider.
    External(String),
}

#[derive(Clone)]
pub struct SeedAdmin {
    pub name: String,
    pub email: String,
    pub credential: SeedCredential,
    /// Promote an existing non-admin account instead of leaving it alone.
    pub promote: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(User),
    Promoted(User),
    AlreadyAdmin(User),
    /// Exists as a regular user and promotion was not requested.
    Unchanged(User),
}

/// Ensure an admin account exists for `seed.email`.
///
/// An existing record is never rewritten beyond its role, and only when
/// `promote` is set.
pub async fn seed_admin(store: &dyn CredentialStore, seed: SeedAdmin) -> Result<SeedOutcome, AuthError> {
    let email = normalize_email(&seed.email)?;

    if let Some(existing) = store.find_user_by_email(&email).await? {
        return promote_existing(store, existing, seed.promote).await;
    }

    let credential = match seed.credential {
        SeedCredential::Password(password) => {
            validate_password(&password)?;
            Credential::PasswordHash(hash_password(&password)?)
        }
        SeedCredential::External(subject) => Credential::External(subject),
    };
    let new_user = NewUser::new(&seed.name, &email, credential)?.with_role(Role::Admin);

    let (user, created) = store.insert_user_if_absent(new_user).await?;
    if created {
        tracing::info!(user_id = %user.id, email = %user.email, "admin account created");
        Ok(SeedOutcome::Created(user))
    } else {
        promote_existing(store, user, seed.promote).await
    }
}

async fn promote_existing(
    store: &dyn CredentialStore,
    user: User,
    promote: bool,
) -> Result<SeedOutcome, AuthError> {
    if user.role.is_admin() {
        return Ok(SeedOutcome::AlreadyAdmin(user));
    }
    if !promote {
        tracing::warn!(user_id = %user.id, email = %user.email, "account exists and is not an admin; pass --promote to promote it");
        return Ok(SeedOutcome::Unchanged(user));
    }
    let promoted = store
        .update_user(
            user.id,
            UserUpdate {
                name: None,
                role: Some(Role::Admin),
            },
        )
        .await?
        .ok_or(AuthError::UnknownUser)?;
    tracing::info!(user_id = %promoted.id, email = %promoted.email, "account promoted to admin");
    Ok(SeedOutcome::Promoted(promoted))
}
