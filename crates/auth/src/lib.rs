//! `bizdir-auth`: identity verification, sessions and authorization.
//!
//! This crate is decoupled from HTTP and from any concrete storage: it talks
//! to the credential store and the external identity provider through the
//! [`CredentialStore`] and [`IdentityProvider`] ports.

pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod error;
pub mod password;
pub mod principal;
pub mod provider;
pub mod roles;
pub mod session;
pub mod store;
pub mod user;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use authenticate::{ProviderAuthenticator, RequestAuthenticator, SessionAuthenticator};
pub use authorize::{AuthzError, Capability, require, require_role_change};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use error::AuthError;
pub use principal::Identity;
pub use provider::{IdentityProvider, ProviderError, ProviderUser};
pub use roles::Role;
pub use session::{SESSION_TTL_SECS, SessionIssuer, SignedSession};
pub use store::CredentialStore;
pub use user::{Credential, NewUser, User, UserProfile, UserUpdate, normalize_email};
pub use verifier::{
    Credentials, DelegatedProviderVerifier, IdentityVerifier, LocalPasswordVerifier,
    Registration, RegistrationSecret, VerifierMode, ensure_profile,
};
