//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

use bizdir_infra::ProviderEndpoint;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// How credentials are verified at login/registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Local,
    Delegated,
}

/// Which bearer tokens protected routes accept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestAuth {
    /// Tokens minted by `/auth/login`.
    #[default]
    Session,
    /// Access tokens of the external identity provider.
    Provider,
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub auth_mode: AuthMode,
    pub request_auth: RequestAuth,
    pub provider: Option<ProviderEndpoint>,
    pub cors_origin: Option<String>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("auth_mode", &self.auth_mode)
            .field("request_auth", &self.request_auth)
            .field("provider", &self.provider)
            .field("cors_origin", &self.cors_origin)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = parse_var(
            "BIND_ADDR",
            var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;
        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => parse_var("DATABASE_MAX_CONNECTIONS", raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let auth_mode = match var("AUTH_MODE").map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("local") => AuthMode::Local,
            Some("delegated") => AuthMode::Delegated,
            Some(other) => return Err(invalid("AUTH_MODE", other, "expected 'local' or 'delegated'")),
        };
        let request_auth = match var("REQUEST_AUTH").map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("session") => RequestAuth::Session,
            Some("provider") => RequestAuth::Provider,
            Some(other) => return Err(invalid("REQUEST_AUTH", other, "expected 'session' or 'provider'")),
        };

        let needs_provider = auth_mode == AuthMode::Delegated || request_auth == RequestAuth::Provider;
        let provider = match var("IDENTITY_PROVIDER_URL") {
            Some(base_url) => Some(ProviderEndpoint {
                base_url,
                anon_key: var("IDENTITY_PROVIDER_ANON_KEY")
                    .ok_or(ConfigError::Missing("IDENTITY_PROVIDER_ANON_KEY"))?,
                service_key: var("IDENTITY_PROVIDER_SERVICE_KEY"),
            }),
            None if needs_provider => return Err(ConfigError::Missing("IDENTITY_PROVIDER_URL")),
            None => None,
        };

        Ok(Self {
            bind_addr,
            database_url: var("DATABASE_URL"),
            database_max_connections,
            jwt_secret,
            auth_mode,
            request_auth,
            provider,
            cors_origin: var("CORS_ORIGIN"),
        })
    }
}

fn invalid(name: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_var<T>(name: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| invalid(name, &raw, e.to_string()))
}
