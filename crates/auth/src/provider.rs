//! Port for the external identity provider used in delegated mode.

use async_trait::async_trait;
use thiserror::Error;

/// The provider's answer to "who is this token for".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub subject_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider understood the request and said no (bad token, bad password).
    #[error("rejected by identity provider: {0}")]
    Rejected(String),

    /// The provider already has an account for this email.
    #[error("identity provider conflict: {0}")]
    Conflict(String),

    /// Transport failure, timeout or 5xx. Safe for the caller to retry.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve an access token to the provider-side user.
    async fn user_for_token(&self, access_token: &str) -> Result<ProviderUser, ProviderError>;

    /// Password grant: exchange email/password for an access token.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<String, ProviderError>;

    /// Create a provider-side account.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<ProviderUser, ProviderError>;
}
