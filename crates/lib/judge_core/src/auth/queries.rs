//! Auth-related database queries.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::auth::{DuplicateField, IssuedToken, NewUser, Role, User};
use crate::store::StoreError;
use crate::uuid::new_token_id;

type UserRow = (
    String,
    String,
    String,
    Option<i64>,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

fn user_from_row(row: UserRow) -> Result<User, StoreError> {
    let (user_id, password_hash, display_name, external_id, role, created_at, deleted_at) = row;
    let role = role
        .parse::<Role>()
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(User {
        user_id,
        password_hash,
        display_name,
        external_id,
        role,
        created_at,
        deleted_at,
    })
}

/// Fetch a user that has not been withdrawn.
pub async fn find_active_user(pool: &PgPool, user_id: &str) -> Result<Option<User>, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT user_id, password_hash, nick_name, student_id, role::text, created_at, deleted_at \
         FROM users WHERE user_id = $1 AND deleted_at IS NULL",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    row.map(user_from_row).transpose()
}

/// Check each unique field independently against active users.
pub async fn find_conflicts(
    pool: &PgPool,
    user_id: &str,
    nick_name: &str,
    student_id: Option<i64>,
) -> Result<Vec<DuplicateField>, StoreError> {
    let (id_taken, nick_taken, student_taken) = sqlx::query_as::<_, (bool, bool, bool)>(
        "SELECT \
           EXISTS(SELECT 1 FROM users WHERE user_id = $1 AND deleted_at IS NULL), \
           EXISTS(SELECT 1 FROM users WHERE nick_name = $2 AND deleted_at IS NULL), \
           ($3::bigint IS NOT NULL AND \
            EXISTS(SELECT 1 FROM users WHERE student_id = $3 AND deleted_at IS NULL))",
    )
    .bind(user_id)
    .bind(nick_name)
    .bind(student_id)
    .fetch_one(pool)
    .await?;

    let mut fields = Vec::new();
    if id_taken {
        fields.push(DuplicateField::Id);
    }
    if nick_taken {
        fields.push(DuplicateField::Nickname);
    }
    if student_taken {
        fields.push(DuplicateField::StudentId);
    }
    Ok(fields)
}

/// Create a new user with the default role.
pub async fn create_user(pool: &PgPool, user: NewUser) -> Result<User, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (user_id, password_hash, nick_name, student_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING user_id, password_hash, nick_name, student_id, role::text, created_at, deleted_at",
    )
    .bind(&user.user_id)
    .bind(&user.password_hash)
    .bind(&user.display_name)
    .bind(user.external_id)
    .fetch_one(pool)
    .await
    .map_err(StoreError::from_insert)?;
    user_from_row(row)
}

/// Soft-delete an active user.
pub async fn soft_delete_user(
    pool: &PgPool,
    user_id: &str,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE users SET deleted_at = $2 WHERE user_id = $1 AND deleted_at IS NULL",
    )
    .bind(user_id)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Change the role of an active user.
pub async fn set_role(pool: &PgPool, user_id: &str, role: Role) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE users SET role = $2::user_role WHERE user_id = $1 AND deleted_at IS NULL",
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Store an issued token, dropping the user's rows already expired at
/// `created_at`.
pub async fn save_token(
    pool: &PgPool,
    user_id: &str,
    token_value: &str,
    created_at: DateTime<Utc>,
    ttl: Duration,
) -> Result<IssuedToken, StoreError> {
    let token = IssuedToken {
        token_id: new_token_id(),
        user_id: user_id.to_string(),
        token_value: token_value.to_string(),
        created_at,
        expires_at: created_at + ttl,
    };
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM issued_tokens WHERE user_id = $1 AND expires_at <= $2")
        .bind(user_id)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO issued_tokens (token_id, user_id, token_value, created_at, expires_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(token.token_id)
    .bind(&token.user_id)
    .bind(&token.token_value)
    .bind(token.created_at)
    .bind(token.expires_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(token)
}

/// Most recent token of the user with `expires_at > valid_at`.
pub async fn latest_token(
    pool: &PgPool,
    user_id: &str,
    valid_at: DateTime<Utc>,
) -> Result<Option<IssuedToken>, StoreError> {
    let row = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>, DateTime<Utc>)>(
        "SELECT token_id, user_id, token_value, created_at, expires_at \
         FROM issued_tokens \
         WHERE user_id = $1 AND expires_at > $2 \
         ORDER BY created_at DESC, token_id DESC \
         LIMIT 1",
    )
    .bind(user_id)
    .bind(valid_at)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(
        |(token_id, user_id, token_value, created_at, expires_at)| IssuedToken {
            token_id,
            user_id,
            token_value,
            created_at,
            expires_at,
        },
    ))
}

/// Delete the exact token rows for a user.
pub async fn delete_token(
    pool: &PgPool,
    user_id: &str,
    token_value: &str,
) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM issued_tokens WHERE user_id = $1 AND token_value = $2")
        .bind(user_id)
        .bind(token_value)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Delete every token of a user.
pub async fn delete_all_tokens(pool: &PgPool, user_id: &str) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM issued_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
