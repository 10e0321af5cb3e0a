use async_trait::async_trait;

use bizdir_core::{BusinessId, StoreResult, UserId};

use crate::{Business, BusinessWithOwner, NewBusiness, StatusChange};

/// Persistence port for business listings.
///
/// Listing methods return records newest first.
#[async_trait]
pub trait BusinessStore: Send + Sync {
    async fn create_business(&self, business: NewBusiness) -> StoreResult<Business>;

    async fn find_business(&self, id: BusinessId) -> StoreResult<Option<Business>>;

    async fn list_approved_businesses(&self) -> StoreResult<Vec<Business>>;

    async fn list_businesses_by_owner(&self, owner: UserId) -> StoreResult<Vec<Business>>;

    /// Every listing, joined with its owner's display name.
    async fn list_businesses_with_owners(&self) -> StoreResult<Vec<BusinessWithOwner>>;

    /// Returns `None` when no listing has this id.
    async fn update_business_status(
        &self,
        id: BusinessId,
        change: StatusChange,
    ) -> StoreResult<Option<Business>>;

    async fn delete_business(&self, id: BusinessId) -> StoreResult<bool>;
}
