//! In-memory store for tests and database-less development.
//!
//! Users and businesses share one lock so that deleting a user and nulling
//! the owner of their listings is a single atomic step.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use bizdir_auth::{CredentialStore, NewUser, User, UserUpdate};
use bizdir_core::{BusinessId, StoreError, StoreResult, UserId};
use bizdir_registry::{
    Business, BusinessStatus, BusinessStore, BusinessWithOwner, NewBusiness, StatusChange,
};

#[derive(Debug, Default)]
struct Tables {
    /// Insertion order; iterate in reverse for newest first.
    users: Vec<User>,
    businesses: Vec<Business>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.write()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        let user = user.into_user(Utc::now());
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn insert_user_if_absent(&self, user: NewUser) -> StoreResult<(User, bool)> {
        let mut tables = self.write()?;
        if let Some(existing) = tables.users.iter().find(|u| u.email == user.email) {
            return Ok((existing.clone(), false));
        }
        let user = user.into_user(Utc::now());
        tables.users.push(user.clone());
        Ok((user, true))
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.read()?.users.iter().rev().cloned().collect())
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> StoreResult<Option<User>> {
        let mut tables = self.write()?;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        update.apply_to(user);
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        for business in tables.businesses.iter_mut().filter(|b| b.is_owned_by(id)) {
            business.owner_id = None;
        }
        Ok(true)
    }
}

#[async_trait]
impl BusinessStore for InMemoryStore {
    async fn create_business(&self, business: NewBusiness) -> StoreResult<Business> {
        let mut tables = self.write()?;
        if let Some(owner) = business.owner_id {
            if !tables.users.iter().any(|u| u.id == owner) {
                return Err(StoreError::NotFound);
            }
        }
        let business = business.into_business(Utc::now());
        tables.businesses.push(business.clone());
        Ok(business)
    }

    async fn find_business(&self, id: BusinessId) -> StoreResult<Option<Business>> {
        Ok(self.read()?.businesses.iter().find(|b| b.id == id).cloned())
    }

    async fn list_approved_businesses(&self) -> StoreResult<Vec<Business>> {
        Ok(self
            .read()?
            .businesses
            .iter()
            .rev()
            .filter(|b| b.status == BusinessStatus::Approved)
            .cloned()
            .collect())
    }

    async fn list_businesses_by_owner(&self, owner: UserId) -> StoreResult<Vec<Business>> {
        Ok(self
            .read()?
            .businesses
            .iter()
            .rev()
            .filter(|b| b.is_owned_by(owner))
            .cloned()
            .collect())
    }

    async fn list_businesses_with_owners(&self) -> StoreResult<Vec<BusinessWithOwner>> {
        let tables = self.read()?;
        Ok(tables
            .businesses
            .iter()
            .rev()
            .map(|b| BusinessWithOwner {
                business: b.clone(),
                owner_name: b
                    .owner_id
                    .and_then(|owner| tables.users.iter().find(|u| u.id == owner))
                    .map(|u| u.name.clone()),
            })
            .collect())
    }

    async fn update_business_status(
        &self,
        id: BusinessId,
        change: StatusChange,
    ) -> StoreResult<Option<Business>> {
        let mut tables = self.write()?;
        let Some(business) = tables.businesses.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        business.apply(&change);
        Ok(Some(business.clone()))
    }

    async fn delete_business(&self, id: BusinessId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let before = tables.businesses.len();
        tables.businesses.retain(|b| b.id != id);
        Ok(tables.businesses.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizdir_auth::{Credential, Role};

    fn new_user(email: &str) -> NewUser {
        NewUser::new("Ada", email, Credential::PasswordHash("h".into())).unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        store.insert_user(new_user("a@x.com")).await.unwrap();
        assert!(matches!(
            store.insert_user(new_user("a@x.com")).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn insert_if_absent_returns_existing_untouched() {
        let store = InMemoryStore::new();
        let (first, created) = store.insert_user_if_absent(new_user("a@x.com")).await.unwrap();
        assert!(created);
        store
            .update_user(first.id, UserUpdate { name: None, role: Some(Role::Admin) })
            .await
            .unwrap();

        let (again, created) = store
            .insert_user_if_absent(NewUser::new("Other", "a@x.com", Credential::External("s".into())).unwrap())
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);
        assert_eq!(again.role, Role::Admin);
        assert_eq!(again.name, "Ada");
    }

    #[tokio::test]
    async fn deleting_owner_keeps_business_with_null_owner() {
        let store = InMemoryStore::new();
        let owner = store.insert_user(new_user("a@x.com")).await.unwrap();
        let business = store
            .create_business(NewBusiness::new(Some(owner.id), "Shop", None).unwrap())
            .await
            .unwrap();

        assert!(store.delete_user(owner.id).await.unwrap());
        assert!(!store.delete_user(owner.id).await.unwrap());

        let kept = store.find_business(business.id).await.unwrap().unwrap();
        assert_eq!(kept.owner_id, None);
        let listed = store.list_businesses_with_owners().await.unwrap();
        assert_eq!(listed[0].owner_name, None);
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_filtered() {
        let store = InMemoryStore::new();
        let owner = store.insert_user(new_user("a@x.com")).await.unwrap();
        let first = store
            .create_business(NewBusiness::new(Some(owner.id), "First", None).unwrap())
            .await
            .unwrap();
        let second = store
            .create_business(NewBusiness::new(None, "Second", None).unwrap())
            .await
            .unwrap();
        for id in [first.id, second.id] {
            store.update_business_status(id, StatusChange::Approve).await.unwrap();
        }
        store
            .create_business(NewBusiness::new(Some(owner.id), "Pending", None).unwrap())
            .await
            .unwrap();

        let approved: Vec<_> = store
            .list_approved_businesses()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(approved, ["Second", "First"]);

        let mine = store.list_businesses_by_owner(owner.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].name, "Pending");

        let all = store.list_businesses_with_owners().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].owner_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn status_update_on_unknown_business_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(
            store
                .update_business_status(BusinessId::new(), StatusChange::Approve)
                .await
                .unwrap(),
            None
        );
        assert!(!store.delete_business(BusinessId::new()).await.unwrap());
    }
}
