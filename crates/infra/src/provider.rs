//! HTTP client for a Supabase-compatible identity provider.
//!
//! - `GET  {base}/auth/v1/user` with `Authorization: Bearer <access token>`
//! - `POST {base}/auth/v1/token?grant_type=password`
//! - `POST {base}/auth/v1/signup`, or `POST {base}/auth/v1/admin/users`
//!   when a service key is configured (the account is created confirmed)
//!
//! Every request carries the `apikey` header.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use bizdir_auth::{IdentityProvider, ProviderError, ProviderUser};

/// Where the provider lives and which keys to present.
#[derive(Clone)]
pub struct ProviderEndpoint {
    pub base_url: String,
    pub anon_key: String,
    pub service_key: Option<String>,
}

impl core::fmt::Debug for ProviderEndpoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProviderEndpoint")
            .field("base_url", &self.base_url)
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    endpoint: ProviderEndpoint,
}

impl HttpIdentityProvider {
    pub fn new(endpoint: ProviderEndpoint) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, mut endpoint: ProviderEndpoint) -> Self {
        endpoint.base_url = endpoint.base_url.trim_end_matches('/').to_string();
        Self { client, endpoint }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.base_url, path)
    }
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: RemoteMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteMetadata {
    name: Option<String>,
    full_name: Option<String>,
}

impl TryFrom<RemoteUser> for ProviderUser {
    type Error = ProviderError;

    fn try_from(user: RemoteUser) -> Result<Self, Self::Error> {
        let email = user
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ProviderError::Rejected("provider user has no email".to_string()))?;
        Ok(ProviderUser {
            subject_id: user.id,
            email,
            display_name: user.user_metadata.name.or(user.user_metadata.full_name),
        })
    }
}

/// Signup answers with the bare user, or with `{user, session}` when the
/// project auto-confirms accounts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    WithSession { user: RemoteUser },
    Bare(RemoteUser),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteError {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

impl RemoteError {
    fn text(self) -> String {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .unwrap_or_else(|| "request rejected".to_string())
    }
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    ProviderError::Unavailable(format!("identity provider request failed: {err}"))
}

/// Turn a non-success response into the port's error cases.
async fn classify_failure(response: reqwest::Response, operation: &str) -> ProviderError {
    let status = response.status();
    let message = response
        .json::<RemoteError>()
        .await
        .unwrap_or_default()
        .text();

    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        warn!(operation, status = status.as_u16(), %message, "identity provider unavailable");
        return ProviderError::Unavailable(format!("{operation} returned {status}: {message}"));
    }
    if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        && message.to_ascii_lowercase().contains("already")
    {
        return ProviderError::Conflict(message);
    }
    debug!(operation, status = status.as_u16(), %message, "identity provider rejected request");
    ProviderError::Rejected(message)
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn user_for_token(&self, access_token: &str) -> Result<ProviderUser, ProviderError> {
        let response = self
            .client
            .get(self.url("/auth/v1/user"))
            .header("apikey", &self.endpoint.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(classify_failure(response, "user").await);
        }
        response
            .json::<RemoteUser>()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("failed to parse user response: {e}")))?
            .try_into()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.endpoint.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(classify_failure(response, "token").await);
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("failed to parse token response: {e}")))?;
        Ok(token.access_token)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<ProviderUser, ProviderError> {
        let request = match &self.endpoint.service_key {
            Some(service_key) => self
                .client
                .post(self.url("/auth/v1/admin/users"))
                .header("apikey", service_key)
                .bearer_auth(service_key)
                .json(&json!({
                    "email": email,
                    "password": password,
                    "email_confirm": true,
                    "user_metadata": { "name": display_name },
                })),
            None => self
                .client
                .post(self.url("/auth/v1/signup"))
                .header("apikey", &self.endpoint.anon_key)
                .json(&json!({
                    "email": email,
                    "password": password,
                    "data": { "name": display_name },
                })),
        };

        let response = request.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(classify_failure(response, "signup").await);
        }
        let user = match response
            .json::<SignUpResponse>()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("failed to parse signup response: {e}")))?
        {
            SignUpResponse::WithSession { user } | SignUpResponse::Bare(user) => user,
        };
        user.try_into()
    }
}
