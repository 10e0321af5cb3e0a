//! Per-request bearer authentication.
//!
//! Two strategies share one trait: our own signed session tokens, or the
//! external provider's access tokens. In both cases the returned [`Identity`]
//! is built from the stored user, so role changes take effect immediately.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{AuthError, CredentialStore, Identity, IdentityProvider, ProviderError, SessionIssuer};

#[async_trait]
pub trait RequestAuthenticator: Send + Sync {
    async fn authenticate(&self, bearer: &str) -> Result<Identity, AuthError>;
}

pub struct SessionAuthenticator {
    issuer: Arc<SessionIssuer>,
    store: Arc<dyn CredentialStore>,
}

impl SessionAuthenticator {
    pub fn new(issuer: Arc<SessionIssuer>, store: Arc<dyn CredentialStore>) -> Self {
        Self { issuer, store }
    }
}

#[async_trait]
impl RequestAuthenticator for SessionAuthenticator {
    async fn authenticate(&self, bearer: &str) -> Result<Identity, AuthError> {
        let claims = self.issuer.verify(bearer)?;
        let user = self
            .store
            .find_user_by_id(claims.sub)
            .await?
            .ok_or_else(|| AuthError::Unauthenticated("User not found or token invalid".to_string()))?;
        Ok(Identity::from(&user))
    }
}

/// Accepts provider access tokens. Only users that already have a local
/// profile are let through; nothing is provisioned here.
pub struct ProviderAuthenticator {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn CredentialStore>,
}

impl ProviderAuthenticator {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn CredentialStore>) -> Self {
        Self { provider, store }
    }
}

#[async_trait]
impl RequestAuthenticator for ProviderAuthenticator {
    async fn authenticate(&self, bearer: &str) -> Result<Identity, AuthError> {
        let remote = self.provider.user_for_token(bearer).await.map_err(|err| match err {
            ProviderError::Rejected(_) => AuthError::InvalidToken("Invalid token".to_string()),
            other => AuthError::from(other),
        })?;

        let email = crate::normalize_email(&remote.email)?;
        let user = self.store.find_user_by_email(&email).await?.ok_or_else(|| {
            tracing::warn!(email = %email, "provider identity has no local profile");
            AuthError::Forbidden("User profile not found".to_string())
        })?;
        Ok(Identity::from(&user))
    }
}
