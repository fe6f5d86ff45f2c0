//! Authentication service: registration, login and the session token
//! lifecycle.
//!
//! Only the most recently issued token of a user is accepted. Issuing a new
//! token (login or refresh) therefore supersedes every older one.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::AuthError;
use super::jwt::TokenCodec;
use super::password::{hash_password_async, verify_password_async};
use crate::models::auth::{NewUser, Role, TokenClaims, User};
use crate::store::{TokenStore, UserStore};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    codec: TokenCodec,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenStore>, codec: TokenCodec) -> Self {
        Self {
            users,
            tokens,
            codec,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Create a student account after checking every unique field.
    pub async fn register(
        &self,
        user_id: &str,
        password: &str,
        display_name: &str,
        external_id: Option<i64>,
    ) -> Result<(), AuthError> {
        if user_id.trim().is_empty() {
            return Err(AuthError::ValidationError("id must not be empty".into()));
        }
        if password.is_empty() {
            return Err(AuthError::ValidationError("password must not be empty".into()));
        }
        if display_name.trim().is_empty() {
            return Err(AuthError::ValidationError(
                "nick_name must not be empty".into(),
            ));
        }

        let conflicts = self
            .users
            .find_conflicts(user_id, display_name, external_id)
            .await?;
        if !conflicts.is_empty() {
            debug!(user_id, ?conflicts, "registration rejected: duplicate fields");
            return Err(AuthError::DuplicateUser(conflicts));
        }

        let password_hash = hash_password_async(password.to_string()).await?;
        self.users
            .create_user(NewUser {
                user_id: user_id.to_string(),
                password_hash,
                display_name: display_name.to_string(),
                external_id,
            })
            .await?;

        info!(user_id, "user registered");
        Ok(())
    }

    /// Check credentials and issue a session token.
    ///
    /// `claimed_role` is whatever the client sent; it never influences the
    /// issued token, which always carries the stored role.
    pub async fn login(
        &self,
        user_id: &str,
        password: &str,
        claimed_role: Option<Role>,
    ) -> Result<String, AuthError> {
        let user = self
            .users
            .find_active_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let matched =
            verify_password_async(password.to_string(), user.password_hash.clone()).await?;
        if !matched {
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(claimed) = claimed_role
            && claimed != user.role
        {
            debug!(user_id, %claimed, stored = %user.role, "ignoring client-claimed role");
        }

        let token = self.issue_token(&user).await?;
        info!(user_id, role = %user.role, "user logged in");
        Ok(token)
    }

    /// Exchange the user's current token for a new one.
    ///
    /// The presented token must be unexpired and still the most recent token
    /// issued to the user.
    pub async fn refresh(&self, old_token: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = self.codec.verify_at(old_token, now)?;

        let latest = self.tokens.latest_token(&claims.user_id, now).await?;
        if latest.is_none_or(|t| t.token_value != old_token) {
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .users
            .find_active_user(&claims.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = self.issue_token(&user).await?;
        debug!(user_id = %user.user_id, "token refreshed");
        Ok(token)
    }

    /// Revoke exactly the presented token.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.codec.verify(token)?;
        let deleted = self.tokens.delete_token(&claims.user_id, token).await?;
        if deleted == 0 {
            return Err(AuthError::InvalidToken);
        }
        info!(user_id = %claims.user_id, "user logged out");
        Ok(())
    }

    /// Soft-delete the user and revoke all of their tokens.
    pub async fn withdraw(&self, user_id: &str) -> Result<(), AuthError> {
        if self.users.find_active_user(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }
        if !self.users.soft_delete_user(user_id, Utc::now()).await? {
            return Err(AuthError::UserNotFound);
        }
        let revoked = self.tokens.delete_all_tokens(user_id).await?;
        info!(user_id, revoked, "user withdrawn");
        Ok(())
    }

    /// Confirm a presented token: signature, expiry, live user and
    /// most-recent store record.
    pub async fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let now = Utc::now();
        let claims = self.codec.verify_at(token, now)?;

        if self.users.find_active_user(&claims.user_id).await?.is_none() {
            warn!(
                user_id = %claims.user_id,
                "validly signed token for a missing user; the signing key may be compromised"
            );
            return Err(AuthError::UserNotFound);
        }

        let latest = self.tokens.latest_token(&claims.user_id, now).await?;
        match latest {
            Some(t) if t.token_value == token => Ok(claims),
            _ => Err(AuthError::InvalidToken),
        }
    }

    /// Change a user's stored role. Applies to tokens issued afterwards.
    pub async fn set_role(&self, user_id: &str, role: Role) -> Result<(), AuthError> {
        if !self.users.set_role(user_id, role).await? {
            return Err(AuthError::UserNotFound);
        }
        info!(user_id, %role, "role changed");
        Ok(())
    }

    async fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let (token, _claims) = self.codec.sign(user, now)?;
        self.tokens
            .save_token(&user.user_id, &token, now, self.codec.ttl())
            .await?;
        Ok(token)
    }
}
