//! Session issuing and verification (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};

use crate::{AuthError, SessionClaims, User, validate_claims};

/// Session lifetime. Fixed; callers cannot request a different expiry.
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// A freshly minted session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and verifies session tokens with a process-wide secret.
///
/// Build once at startup and share behind an `Arc`; the keys are immutable.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionIssuer").finish_non_exhaustive()
    }
}

impl SessionIssuer {
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::internal("session signing secret must not be empty"));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn issue(&self, user: &User) -> Result<SignedSession, AuthError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token as of `now` (deterministic tests).
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<SignedSession, AuthError> {
        let expires_at = now + Duration::seconds(SESSION_TTL_SECS);
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::internal(format!("failed to sign session: {e}")))?;
        Ok(SignedSession { token, expires_at })
    }

    /// Check signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::InvalidToken("Token expired".to_string()),
                _ => AuthError::InvalidToken("Invalid token".to_string()),
            })?;
        validate_claims(&data.claims, Utc::now())?;
        Ok(data.claims)
    }
}
