//! User records as held by the credential store.
//!
//! Credential material never leaves this module in serialized form: the
//! public view of a user is [`UserProfile`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use bizdir_core::{DomainError, DomainResult, UserId};

use crate::Role;

/// How a user proves who they are.
///
/// Exactly one kind per record; which kind is used depends on the deployment
/// mode the record was created under.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Argon2 PHC string.
    PasswordHash(String),
    /// Subject id at the external identity provider.
    External(String),
}

impl Credential {
    pub fn password_hash(&self) -> Option<&str> {
        match self {
            Credential::PasswordHash(hash) => Some(hash),
            Credential::External(_) => None,
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        match self {
            Credential::External(id) => Some(id),
            Credential::PasswordHash(_) => None,
        }
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Credential::PasswordHash(_) => f.write_str("PasswordHash(<redacted>)"),
            Credential::External(id) => f.debug_tuple("External").field(id).finish(),
        }
    }
}

/// A persisted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub credential: Credential,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Public projection of a user (safe to return over the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A user about to be inserted.
///
/// Construct through [`NewUser::new`] so the email is normalized and the name
/// validated before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub credential: Credential,
    pub role: Role,
}

impl NewUser {
    /// New user with the default `user` role.
    pub fn new(name: &str, email: &str, credential: Credential) -> DomainResult<Self> {
        Ok(Self {
            name: validate_name(name)?,
            email: normalize_email(email)?,
            credential,
            role: Role::User,
        })
    }

    /// Only provisioning paths call this; registration always goes through [`NewUser::new`].
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Materialize the record with a fresh id and creation time.
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: UserId::new(),
            name: self.name,
            email: self.email,
            credential: self.credential,
            role: self.role,
            created_at: now,
        }
    }
}

/// Partial update applied by `PUT /users/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none()
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

/// Trim and lowercase an email address, rejecting obviously malformed input.
pub fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(DomainError::validation("email is required"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(DomainError::validation("email is malformed")),
    }
}

pub fn validate_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name is required"));
    }
    Ok(name.to_string())
}
