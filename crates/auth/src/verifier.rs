//! Identity verification: local passwords or a delegated identity provider.
//!
//! Both variants sit behind [`IdentityVerifier`]; which one a deployment uses
//! is decided once, at startup, from configuration.

use std::sync::Arc;

use async_trait::async_trait;

use crate::password::{hash_password, validate_password, verify_against_placeholder, verify_password};
use crate::user::validate_name;
use crate::{
    AuthError, Credential, CredentialStore, IdentityProvider, NewUser, ProviderUser, Role, User,
    normalize_email,
};

/// What a client presents to log in.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Password { email: String, password: String },
    /// Access token issued by the external identity provider.
    ProviderToken(String),
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Credentials::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .finish_non_exhaustive(),
            Credentials::ProviderToken(_) => f.write_str("ProviderToken(<redacted>)"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum RegistrationSecret {
    Password(String),
    ProviderToken(String),
}

/// A registration request.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub secret: RegistrationSecret,
    /// Written with the account in the same insert. Self-service callers
    /// always pass `Role::User`.
    pub role: Role,
}

impl Registration {
    pub fn new(name: impl Into<String>, email: impl Into<String>, secret: RegistrationSecret) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            secret,
            role: Role::User,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

impl core::fmt::Debug for Registration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierMode {
    LocalPassword,
    DelegatedProvider,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    fn mode(&self) -> VerifierMode;

    /// Create a new account with the registration's role in a single write.
    /// A taken email is a `Conflict` and leaves the existing record untouched.
    async fn register(&self, registration: Registration) -> Result<User, AuthError>;

    /// Validate credentials and return the canonical local user.
    async fn verify(&self, credentials: Credentials) -> Result<User, AuthError>;
}

/// Resolve or create the local profile for an externally verified identity.
///
/// An existing profile (matched by email) is returned unchanged, whatever
/// `display_name` says. Safe to call repeatedly and concurrently: the store
/// arbitrates first-time races with its unique email constraint.
pub async fn ensure_profile(
    store: &dyn CredentialStore,
    external_id: &str,
    email: &str,
    display_name: &str,
) -> Result<(User, bool), AuthError> {
    provision_profile(store, external_id, email, display_name, Role::User).await
}

async fn provision_profile(
    store: &dyn CredentialStore,
    external_id: &str,
    email: &str,
    display_name: &str,
    role: Role,
) -> Result<(User, bool), AuthError> {
    let email = normalize_email(email)?;
    let name = match display_name.trim() {
        "" => email.split('@').next().unwrap_or_default().to_string(),
        name => name.to_string(),
    };
    let new_user =
        NewUser::new(&name, &email, Credential::External(external_id.to_string()))?.with_role(role);
    let (user, created) = store.insert_user_if_absent(new_user).await?;
    if created {
        tracing::info!(user_id = %user.id, email = %user.email, "provisioned local profile");
    }
    Ok((user, created))
}

// ─────────────────────────────────────────────────────────────────────────────
// Local password
// ─────────────────────────────────────────────────────────────────────────────

pub struct LocalPasswordVerifier {
    store: Arc<dyn CredentialStore>,
}

impl LocalPasswordVerifier {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityVerifier for LocalPasswordVerifier {
    fn mode(&self) -> VerifierMode {
        VerifierMode::LocalPassword
    }

    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let RegistrationSecret::Password(password) = &registration.secret else {
            return Err(AuthError::Validation(
                "password is required for registration".to_string(),
            ));
        };
        let name = validate_name(&registration.name)?;
        let email = normalize_email(&registration.email)?;
        validate_password(password)?;

        let hash = hash_password(password)?;
        let user = self
            .store
            .insert_user(NewUser::new(&name, &email, Credential::PasswordHash(hash))?.with_role(registration.role))
            .await?;

        tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
        Ok(user)
    }

    async fn verify(&self, credentials: Credentials) -> Result<User, AuthError> {
        let Credentials::Password { email, password } = credentials else {
            return Err(AuthError::InvalidCredential);
        };
        let email = normalize_email(&email)?;
        if password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            // Same argon2 cost as a real mismatch.
            verify_against_placeholder(&password);
            return Err(AuthError::UnknownUser);
        };

        match user.credential.password_hash() {
            Some(hash) if verify_password(hash, &password) => Ok(user),
            _ => Err(AuthError::InvalidCredential),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Delegated provider
// ─────────────────────────────────────────────────────────────────────────────

pub struct DelegatedProviderVerifier {
    store: Arc<dyn CredentialStore>,
    provider: Arc<dyn IdentityProvider>,
}

impl DelegatedProviderVerifier {
    pub fn new(store: Arc<dyn CredentialStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { store, provider }
    }

    async fn resolve_token(&self, access_token: &str) -> Result<(User, bool), AuthError> {
        let ProviderUser {
            subject_id,
            email,
            display_name,
        } = self.provider.user_for_token(access_token).await?;
        ensure_profile(
            self.store.as_ref(),
            &subject_id,
            &email,
            display_name.as_deref().unwrap_or_default(),
        )
        .await
    }
}

#[async_trait]
impl IdentityVerifier for DelegatedProviderVerifier {
    fn mode(&self) -> VerifierMode {
        VerifierMode::DelegatedProvider
    }

    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let name = validate_name(&registration.name)?;
        let (user, created) = match &registration.secret {
            RegistrationSecret::Password(password) => {
                let email = normalize_email(&registration.email)?;
                validate_password(password)?;
                if self.store.find_user_by_email(&email).await?.is_some() {
                    return Err(AuthError::Conflict("User already exists".to_string()));
                }
                let remote = self.provider.sign_up(&email, password, &name).await?;
                provision_profile(
                    self.store.as_ref(),
                    &remote.subject_id,
                    &remote.email,
                    &name,
                    registration.role,
                )
                .await?
            }
            RegistrationSecret::ProviderToken(token) => {
                let remote = self.provider.user_for_token(token).await?;
                provision_profile(
                    self.store.as_ref(),
                    &remote.subject_id,
                    &remote.email,
                    &name,
                    registration.role,
                )
                .await?
            }
        };

        if !created {
            return Err(AuthError::Conflict("User already exists".to_string()));
        }
        tracing::info!(user_id = %user.id, email = %user.email, "user registered via identity provider");
        Ok(user)
    }

    async fn verify(&self, credentials: Credentials) -> Result<User, AuthError> {
        let token = match credentials {
            Credentials::Password { email, password } => {
                let email = normalize_email(&email)?;
                if password.is_empty() {
                    return Err(AuthError::Validation("password is required".to_string()));
                }
                self.provider.sign_in_with_password(&email, &password).await?
            }
            Credentials::ProviderToken(token) => token,
        };
        let (user, _) = self.resolve_token(&token).await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeProvider, MemoryCredentialStore};
    use crate::{Role, UserUpdate};

    fn registration(email: &str, password: &str) -> Registration {
        Registration::new("Ada", email, RegistrationSecret::Password(password.into()))
    }

    fn password(email: &str, password: &str) -> Credentials {
        Credentials::Password {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn local_register_then_login() {
        let store = Arc::new(MemoryCredentialStore::default());
        let verifier = LocalPasswordVerifier::new(store.clone());

        let registered = verifier.register(registration("A@X.com", "secret-pw")).await.unwrap();
        assert_eq!(registered.role, Role::User);
        assert_eq!(registered.email, "a@x.com");

        let logged_in = verifier.verify(password("a@x.com", "secret-pw")).await.unwrap();
        assert_eq!(logged_in.id, registered.id);
    }

    #[tokio::test]
    async fn local_login_distinguishes_unknown_user_and_bad_password() {
        let store = Arc::new(MemoryCredentialStore::default());
        let verifier = LocalPasswordVerifier::new(store);
        verifier.register(registration("a@x.com", "secret-pw")).await.unwrap();

        assert_eq!(
            verifier.verify(password("b@x.com", "secret-pw")).await,
            Err(AuthError::UnknownUser)
        );
        assert_eq!(
            verifier.verify(password("a@x.com", "wrong-pw")).await,
            Err(AuthError::InvalidCredential)
        );
        assert_eq!(
            verifier.verify(Credentials::ProviderToken("t".into())).await,
            Err(AuthError::InvalidCredential)
        );
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_and_keeps_role() {
        let store = Arc::new(MemoryCredentialStore::default());
        let verifier = LocalPasswordVerifier::new(store.clone());
        let first = verifier.register(registration("a@x.com", "secret-pw")).await.unwrap();
        store
            .update_user(first.id, UserUpdate { name: None, role: Some(Role::Admin) })
            .await
            .unwrap();

        let err = verifier.register(registration("A@x.com", "other-pw")).await.unwrap_err();
        assert_eq!(err, AuthError::Conflict("User already exists".into()));

        let stored = store.find_user_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Admin);
    }

    #[tokio::test]
    async fn registration_validates_fields() {
        let verifier = LocalPasswordVerifier::new(Arc::new(MemoryCredentialStore::default()));
        assert!(matches!(
            verifier.register(registration("a@x.com", "123")).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            verifier.register(registration("", "secret-pw")).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn ensure_profile_is_idempotent() {
        let store = MemoryCredentialStore::default();
        let (first, created) = ensure_profile(&store, "sub-1", "a@x.com", "Ada").await.unwrap();
        assert!(created);
        let writes = store.write_count();

        let (second, created) = ensure_profile(&store, "sub-2", "A@X.COM", "Someone Else").await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Ada");
        assert_eq!(second.role, Role::User);
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn ensure_profile_falls_back_to_email_local_part() {
        let store = MemoryCredentialStore::default();
        let (user, _) = ensure_profile(&store, "sub-1", "grace@x.com", "  ").await.unwrap();
        assert_eq!(user.name, "grace");
    }

    #[tokio::test]
    async fn concurrent_first_time_profiles_converge() {
        let store = MemoryCredentialStore::default();
        let (a, b) = tokio::join!(
            ensure_profile(&store, "sub-1", "a@x.com", "Ada"),
            ensure_profile(&store, "sub-1", "a@x.com", "Ada"),
        );
        assert_eq!(a.unwrap().0.id, b.unwrap().0.id);
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delegated_login_provisions_then_reuses_profile() {
        let store = Arc::new(MemoryCredentialStore::default());
        let provider = Arc::new(FakeProvider::with_user(
            "tok-1",
            "pw-123456",
            ProviderUser {
                subject_id: "sub-1".into(),
                email: "a@x.com".into(),
                display_name: Some("Ada".into()),
            },
        ));
        let verifier = DelegatedProviderVerifier::new(store.clone(), provider);

        let first = verifier.verify(Credentials::ProviderToken("tok-1".into())).await.unwrap();
        store
            .update_user(first.id, UserUpdate { name: None, role: Some(Role::Admin) })
            .await
            .unwrap();

        let again = verifier.verify(password("a@x.com", "pw-123456")).await.unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.role, Role::Admin);
        assert_eq!(again.credential, Credential::External("sub-1".into()));
    }

    #[tokio::test]
    async fn delegated_maps_provider_failures() {
        let store = Arc::new(MemoryCredentialStore::default());
        let rejecting = DelegatedProviderVerifier::new(store.clone(), Arc::new(FakeProvider::default()));
        assert_eq!(
            rejecting.verify(Credentials::ProviderToken("nope".into())).await,
            Err(AuthError::InvalidCredential)
        );

        let down = FakeProvider {
            unavailable: true,
            ..FakeProvider::default()
        };
        let unavailable = DelegatedProviderVerifier::new(store, Arc::new(down));
        assert!(matches!(
            unavailable.verify(Credentials::ProviderToken("t".into())).await,
            Err(AuthError::ProviderUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn delegated_register_signs_up_once() {
        let store = Arc::new(MemoryCredentialStore::default());
        let verifier = DelegatedProviderVerifier::new(store, Arc::new(FakeProvider::default()));

        let user = verifier.register(registration("a@x.com", "pw-123456")).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert!(user.credential.external_id().is_some());

        assert_eq!(
            verifier.register(registration("a@x.com", "pw-123456")).await,
            Err(AuthError::Conflict("User already exists".into()))
        );
    }

    #[tokio::test]
    async fn local_register_writes_requested_role_in_one_insert() {
        let store = Arc::new(MemoryCredentialStore::default());
        let verifier = LocalPasswordVerifier::new(store.clone());

        let user = verifier
            .register(registration("a@x.com", "secret-pw").with_role(Role::Admin))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(store.write_count(), 1);
        let stored = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Admin);
    }

    #[tokio::test]
    async fn delegated_register_writes_requested_role_in_one_insert() {
        let store = Arc::new(MemoryCredentialStore::default());
        let verifier = DelegatedProviderVerifier::new(store.clone(), Arc::new(FakeProvider::default()));

        let user = verifier
            .register(registration("a@x.com", "pw-123456").with_role(Role::Admin))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn delegated_register_checks_local_profile_before_provider_sign_up() {
        let store = Arc::new(MemoryCredentialStore::default());
        ensure_profile(store.as_ref(), "seeded-sub", "a@x.com", "Ada").await.unwrap();
        let provider = Arc::new(FakeProvider::default());
        let verifier = DelegatedProviderVerifier::new(store, provider.clone());

        assert_eq!(
            verifier.register(registration("A@x.com", "pw-123456")).await,
            Err(AuthError::Conflict("User already exists".into()))
        );
        assert!(provider.users.lock().unwrap().is_empty());
    }
}
