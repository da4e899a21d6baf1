//! Models that represent users and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{types::UserId, validation::rules::validate_username};

#[derive(Debug, Clone, FromRow)]
/// Database representation of a user account.
pub struct User {
    /// Unique identifier for the user.
    pub id: UserId,
    /// Display name chosen at registration.
    pub username: String,
    /// Unique login identifier.
    pub email: String,
    /// Argon2 PHC hash of the user's password.
    pub password_hash: String,
    /// Session epoch stamp. Every token carries a copy; rotating it revokes
    /// them all.
    pub identity_version: Uuid,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp for auditing.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
/// Values required to insert a user row.
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub identity_version: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for registering a new account.
pub struct RegisterUser {
    #[validate(
        length(min = 3, max = 16),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 3, max = 16))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Body of a token refresh request.
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Payload submitted when a user changes their password.
pub struct ChangePasswordRequest {
    /// Existing password that must verify before the change applies.
    pub old_password: String,
    /// Replacement password.
    #[validate(length(min = 3, max = 16))]
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
/// Access/refresh pair returned by login and refresh.
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
/// Public view of a user; never includes credentials.
pub struct UserResponse {
    #[schema(value_type = i64)]
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}
