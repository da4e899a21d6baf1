use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::user::{NewUser, User};
use crate::types::UserId;

/// Finds a user by their ID.
pub async fn find_user_by_id(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, identity_version, created_at, updated_at \
         FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Finds a user by their email address.
pub async fn find_user_by_email(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, identity_version, created_at, updated_at \
         FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(conn)
    .await
}

pub async fn list_users(conn: &mut PgConnection) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, identity_version, created_at, updated_at \
         FROM users ORDER BY id",
    )
    .fetch_all(conn)
    .await
}

pub async fn insert_user(conn: &mut PgConnection, user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash, identity_version) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, username, email, password_hash, identity_version, created_at, updated_at",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.identity_version)
    .fetch_one(conn)
    .await
}

/// Replaces the password hash and identity version in one statement.
pub async fn update_user_credentials(
    conn: &mut PgConnection,
    user_id: UserId,
    password_hash: &str,
    identity_version: Uuid,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET password_hash = $1, identity_version = $2, updated_at = NOW() \
         WHERE id = $3 \
         RETURNING id, username, email, password_hash, identity_version, created_at, updated_at",
    )
    .bind(password_hash)
    .bind(identity_version)
    .bind(user_id)
    .fetch_one(conn)
    .await
}

pub async fn update_identity_version(
    conn: &mut PgConnection,
    user_id: UserId,
    identity_version: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET identity_version = $1, updated_at = NOW() WHERE id = $2")
        .bind(identity_version)
        .bind(user_id)
        .execute(conn)
        .await
        .map(|_| ())
}

/// Deletes a user; refresh sessions go with it via `ON DELETE CASCADE`.
pub async fn delete_user(conn: &mut PgConnection, user_id: UserId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
