//! Minimal in-crate fakes for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use bizdir_core::{StoreError, StoreResult, UserId};

use crate::{
    CredentialStore, IdentityProvider, NewUser, ProviderError, ProviderUser, User, UserUpdate,
};

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<Vec<User>>,
    pub writes: Mutex<usize>,
}

impl MemoryCredentialStore {
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        let user = user.into_user(Utc::now());
        users.push(user.clone());
        *self.writes.lock().unwrap() += 1;
        Ok(user)
    }

    async fn insert_user_if_absent(&self, user: NewUser) -> StoreResult<(User, bool)> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter().find(|u| u.email == user.email) {
            return Ok((existing.clone(), false));
        }
        let user = user.into_user(Utc::now());
        users.push(user.clone());
        *self.writes.lock().unwrap() += 1;
        Ok((user, true))
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> StoreResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        update.apply_to(user);
        *self.writes.lock().unwrap() += 1;
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

/// Provider that knows a fixed set of tokens.
#[derive(Default)]
pub struct FakeProvider {
    pub users: Mutex<Vec<(String, String, ProviderUser)>>,
    pub unavailable: bool,
}

impl FakeProvider {
    pub fn with_user(token: &str, password: &str, user: ProviderUser) -> Self {
        Self {
            users: Mutex::new(vec![(token.to_string(), password.to_string(), user)]),
            unavailable: false,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn user_for_token(&self, access_token: &str) -> Result<ProviderUser, ProviderError> {
        if self.unavailable {
            return Err(ProviderError::Unavailable("connection refused".into()));
        }
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|(token, _, _)| token == access_token)
            .map(|(_, _, user)| user.clone())
            .ok_or_else(|| ProviderError::Rejected("invalid JWT".into()))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<String, ProviderError> {
        if self.unavailable {
            return Err(ProviderError::Unavailable("connection refused".into()));
        }
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|(_, pw, user)| user.email == email && pw == password)
            .map(|(token, _, _)| token.clone())
            .ok_or_else(|| ProviderError::Rejected("Invalid login credentials".into()))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<ProviderUser, ProviderError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|(_, _, u)| u.email == email) {
            return Err(ProviderError::Conflict("User already registered".into()));
        }
        let user = ProviderUser {
            subject_id: format!("sub-{}", users.len() + 1),
            email: email.to_string(),
            display_name: Some(display_name.to_string()),
        };
        let token = format!("token-{}", users.len() + 1);
        users.push((token, password.to_string(), user.clone()));
        Ok(user)
    }
}
