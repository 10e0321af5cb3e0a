//! Service wiring: stores, verifier, authenticator and session issuer.
//!
//! Everything is constructed once at startup and shared immutably; handlers
//! reach it through `Extension<Arc<AppServices>>`.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use bizdir_auth::{
    AuthError, CredentialStore, DelegatedProviderVerifier, IdentityProvider, IdentityVerifier,
    LocalPasswordVerifier, ProviderAuthenticator, ProviderError, RequestAuthenticator,
    SessionAuthenticator, SessionIssuer,
};
use bizdir_infra::{HttpIdentityProvider, InMemoryStore, PgStore};
use bizdir_registry::BusinessStore;

use crate::config::{AppConfig, AuthMode, RequestAuth};

#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<dyn CredentialStore>,
    pub businesses: Arc<dyn BusinessStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub authenticator: Arc<dyn RequestAuthenticator>,
    pub sessions: Arc<SessionIssuer>,
}

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("invalid session secret: {0}")]
    Session(#[from] AuthError),

    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("failed to build identity provider client: {0}")]
    Provider(#[from] ProviderError),

    #[error("{0} requires an identity provider to be configured")]
    ProviderMissing(&'static str),
}

/// Storage backing chosen at startup.
pub enum Storage {
    Postgres(PgStore),
    Memory(Arc<InMemoryStore>),
}

impl Storage {
    pub async fn from_config(config: &AppConfig) -> Result<Self, WiringError> {
        match &config.database_url {
            Some(url) => {
                let pool = bizdir_infra::connect(url, config.database_max_connections).await?;
                let store = PgStore::new(pool);
                store.migrate().await?;
                tracing::info!("connected to postgres");
                Ok(Storage::Postgres(store))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
                Ok(Storage::Memory(Arc::new(InMemoryStore::new())))
            }
        }
    }

    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Storage::Postgres(store) => Some(store.pool()),
            Storage::Memory(_) => None,
        }
    }

    fn ports(&self) -> (Arc<dyn CredentialStore>, Arc<dyn BusinessStore>) {
        match self {
            Storage::Postgres(store) => {
                let store = Arc::new(store.clone());
                let users: Arc<dyn CredentialStore> = store.clone();
                let businesses: Arc<dyn BusinessStore> = store;
                (users, businesses)
            }
            Storage::Memory(store) => {
                let users: Arc<dyn CredentialStore> = store.clone();
                let businesses: Arc<dyn BusinessStore> = store.clone();
                (users, businesses)
            }
        }
    }
}

impl AppServices {
    /// Wire services from configuration over an already opened storage.
    pub fn from_config(config: &AppConfig, storage: &Storage) -> Result<Self, WiringError> {
        let provider: Option<Arc<dyn IdentityProvider>> = match &config.provider {
            Some(endpoint) => Some(Arc::new(HttpIdentityProvider::new(endpoint.clone())?)),
            None => None,
        };
        let (users, businesses) = storage.ports();
        Self::assemble(
            users,
            businesses,
            config.jwt_secret.as_bytes(),
            config.auth_mode,
            config.request_auth,
            provider,
        )
    }

    /// Assemble from explicit parts. Tests use this with fakes.
    pub fn assemble(
        users: Arc<dyn CredentialStore>,
        businesses: Arc<dyn BusinessStore>,
        jwt_secret: &[u8],
        auth_mode: AuthMode,
        request_auth: RequestAuth,
        provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Result<Self, WiringError> {
        let sessions = Arc::new(SessionIssuer::new(jwt_secret)?);

        let verifier: Arc<dyn IdentityVerifier> = match auth_mode {
            AuthMode::Local => Arc::new(LocalPasswordVerifier::new(users.clone())),
            AuthMode::Delegated => {
                let provider = provider.clone().ok_or(WiringError::ProviderMissing("AUTH_MODE=delegated"))?;
                Arc::new(DelegatedProviderVerifier::new(users.clone(), provider))
            }
        };

        let authenticator: Arc<dyn RequestAuthenticator> = match request_auth {
            RequestAuth::Session => Arc::new(SessionAuthenticator::new(sessions.clone(), users.clone())),
            RequestAuth::Provider => {
                let provider = provider.ok_or(WiringError::ProviderMissing("REQUEST_AUTH=provider"))?;
                Arc::new(ProviderAuthenticator::new(provider, users.clone()))
            }
        };

        Ok(Self {
            users,
            businesses,
            verifier,
            authenticator,
            sessions,
        })
    }

    /// In-memory, local-password, session-token services.
    pub fn in_memory(jwt_secret: &[u8]) -> Result<Self, WiringError> {
        let store = Arc::new(InMemoryStore::new());
        Self::assemble(
            store.clone(),
            store,
            jwt_secret,
            AuthMode::Local,
            RequestAuth::Session,
            None,
        )
    }
}
