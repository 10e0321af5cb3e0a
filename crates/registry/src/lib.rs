//! Business registry domain module.
//!
//! Business listings and their moderation lifecycle, implemented as pure
//! domain logic plus the [`BusinessStore`] port. No IO, no HTTP.

pub mod business;
pub mod store;
pub mod visibility;

pub use business::{Business, BusinessStatus, BusinessWithOwner, NewBusiness, StatusChange};
pub use store::BusinessStore;
pub use visibility::Viewer;
