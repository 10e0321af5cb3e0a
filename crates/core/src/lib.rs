//! `bizdir-core`: shared building blocks for the directory service.
//!
//! This crate contains **pure** primitives (identifiers and error types) that
//! every other crate agrees on. No IO lives here.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, StoreError, StoreResult};
pub use id::{BusinessId, UserId};
