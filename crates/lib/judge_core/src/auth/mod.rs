//! Authentication and authorization logic.
//!
//! Provides password hashing, the session token codec, the database
//! queries behind `PgStore`, and `AuthService`, which orchestrates the
//! token lifecycle on top of the store traits.

pub mod jwt;
pub mod password;
pub mod queries;
pub mod service;

use thiserror::Error;

use crate::models::auth::{DuplicateField, Principal, Role};
use crate::store::StoreError;

pub use jwt::TokenCodec;
pub use service::AuthService;

/// Authentication errors.
///
/// `InvalidToken` covers every token rejection (bad signature, expiry,
/// missing or superseded store record) so callers cannot tell which check
/// failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Existing user. Duplicated elements: [ {} ]", join_fields(.0))]
    DuplicateUser(Vec<DuplicateField>),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient role")]
    UnauthorizedRole,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_fields(fields: &[DuplicateField]) -> String {
    fields
        .iter()
        .map(DuplicateField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Allow when nothing is required or the principal's role is listed.
pub fn check_role(principal: &Principal, required: &[Role]) -> Result<(), AuthError> {
    if required.is_empty() || required.contains(&principal.role) {
        Ok(())
    } else {
        Err(AuthError::UnauthorizedRole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_lists_every_field() {
        let err = AuthError::DuplicateUser(vec![DuplicateField::Id, DuplicateField::Nickname]);
        assert_eq!(
            err.to_string(),
            "Existing user. Duplicated elements: [ id, nickname ]"
        );
    }

    #[test]
    fn check_role_matrix() {
        let student = Principal {
            user_id: "s".into(),
            role: Role::Student,
        };
        let staff = [Role::Professor, Role::Admin];
        assert!(check_role(&student, &[]).is_ok());
        assert!(matches!(
            check_role(&student, &staff),
            Err(AuthError::UnauthorizedRole)
        ));
        for role in staff {
            let p = Principal {
                user_id: "p".into(),
                role,
            };
            assert!(check_role(&p, &staff).is_ok());
        }
    }
}
