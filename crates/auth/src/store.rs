//! Credential store port.

use async_trait::async_trait;

use bizdir_core::{StoreResult, UserId};

use crate::{NewUser, User, UserUpdate};

/// Persisted user records.
///
/// Emails handed to the store are already normalized (see
/// [`crate::normalize_email`]); implementations compare them verbatim and
/// enforce uniqueness.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user. A duplicate email fails with `StoreError::Conflict`.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    /// Atomically insert `user` unless its email is taken, then read the row.
    ///
    /// Returns the stored user and whether this call created it. An existing
    /// row is returned untouched.
    async fn insert_user_if_absent(&self, user: NewUser) -> StoreResult<(User, bool)>;

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// All users, newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Apply a partial update. `Ok(None)` when the user does not exist.
    async fn update_user(&self, id: UserId, update: UserUpdate) -> StoreResult<Option<User>>;

    /// Remove a user; businesses they own are kept with their owner cleared.
    async fn delete_user(&self, id: UserId) -> StoreResult<bool>;
}
