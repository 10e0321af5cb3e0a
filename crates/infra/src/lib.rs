//! Infrastructure layer: storage adapters and the identity provider client.
//!
//! Everything here implements a port declared by a domain crate:
//! [`bizdir_auth::CredentialStore`], [`bizdir_registry::BusinessStore`] and
//! [`bizdir_auth::IdentityProvider`].

pub mod memory;
pub mod postgres;
pub mod provider;

pub use memory::InMemoryStore;
pub use postgres::{PgStore, connect};
pub use provider::{HttpIdentityProvider, ProviderEndpoint};
