//! Session token signing and verification (HS256 JWT).

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{info, warn};
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{TokenClaims, User};

/// Session token lifetime: 1 hour.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// Signs and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Codec with the standard one hour lifetime.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::seconds(TOKEN_TTL_SECS))
    }

    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Build claims for `user` issued at `issued_at` and sign them.
    ///
    /// The role comes from the stored user record only.
    pub fn sign(
        &self,
        user: &User,
        issued_at: DateTime<Utc>,
    ) -> Result<(String, TokenClaims), AuthError> {
        let claims = TokenClaims {
            user_id: user.user_id.clone(),
            nick_name: user.display_name.clone(),
            student_id: user.external_id,
            role: user.role,
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        let token = self.encode(&claims)?;
        Ok((token, claims))
    }

    pub fn encode(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify against the current clock.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify as of `now`. Rejects when `now >= exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared below against the supplied instant.
        validation.validate_exp = false;
        let claims = decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|_| AuthError::InvalidToken)?
            .claims;
        if now.timestamp() >= claims.exp {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → persisted file → generated.
///
/// Falling back off the environment is logged as a warning; production
/// deployments are expected to set `JWT_SECRET`.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    warn!("JWT_SECRET is not set; falling back to a locally persisted secret");
    load_or_generate_secret(&jwt_secret_path())
}

/// Read the secret stored at `path`, generating and persisting one if absent.
pub fn load_or_generate_secret(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = std::fs::write(path, &secret) {
        warn!(path = %path.display(), error = %e, "could not persist JWT secret; tokens will not survive a restart");
    } else {
        info!(path = %path.display(), "generated new JWT secret");
    }
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("judge")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    fn user(role: Role) -> User {
        User {
            user_id: "alice".into(),
            password_hash: String::new(),
            display_name: "Alice".into(),
            external_id: Some(100),
            role,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn sign_then_verify_returns_same_claims() {
        let codec = TokenCodec::new(b"secret");
        let (token, claims) = codec.sign(&user(Role::Professor), Utc::now()).unwrap();
        let first = codec.verify(&token).unwrap();
        let second = codec.verify(&token).unwrap();
        assert_eq!(first, claims);
        assert_eq!(first, second);
        assert_eq!(first.role, Role::Professor);
        assert_eq!(first.exp - first.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let codec = TokenCodec::new(b"secret");
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let (token, _) = codec.sign(&user(Role::Student), issued).unwrap();
        let expires = issued + Duration::seconds(TOKEN_TTL_SECS);

        assert!(codec.verify_at(&token, expires - Duration::seconds(1)).is_ok());
        assert!(matches!(
            codec.verify_at(&token, expires),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_stays_rejected() {
        let codec = TokenCodec::new(b"secret");
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let (token, _) = codec.sign(&user(Role::Student), issued).unwrap();
        let late = issued + Duration::seconds(TOKEN_TTL_SECS) + Duration::minutes(5);
        assert!(matches!(
            codec.verify_at(&token, late),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = TokenCodec::new(b"secret");
        let theirs = TokenCodec::new(b"other-secret");
        let (token, _) = theirs.sign(&user(Role::Admin), Utc::now()).unwrap();
        assert!(matches!(ours.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        let codec = TokenCodec::new(b"secret");
        assert!(matches!(
            codec.verify("not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn tokens_issued_in_the_same_second_differ() {
        let codec = TokenCodec::new(b"secret");
        let now = Utc::now();
        let (a, _) = codec.sign(&user(Role::Student), now).unwrap();
        let (b, _) = codec.sign(&user(Role::Student), now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn secret_is_generated_once_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jwt-secret");
        let first = load_or_generate_secret(&path);
        assert_eq!(first.len(), 64);
        let second = load_or_generate_secret(&path);
        assert_eq!(first, second);
    }
}
