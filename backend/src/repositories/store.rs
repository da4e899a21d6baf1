//! Transactional persistence seam used by the services.
//!
//! Every service operation opens one [`AuthTransaction`], performs its reads
//! and writes through it, and commits. Dropping a transaction without
//! committing discards everything it did.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    refresh_session::NewRefreshSession,
    user::{NewUser, User},
};
use crate::types::UserId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique key (user email or session jti) already exists.
    #[error("unique constraint violated")]
    Conflict,
    #[error("database error")]
    Database(#[source] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Database(err),
        }
    }
}

/// Opens transactions against a backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn AuthTransaction>, StoreError>;
}

/// One unit of work over users and refresh sessions.
#[async_trait]
pub trait AuthTransaction: Send {
    async fn find_user_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;

    /// All users ordered by id.
    async fn list_users(&mut self) -> Result<Vec<User>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError>;

    async fn update_user_credentials(
        &mut self,
        id: UserId,
        password_hash: &str,
        identity_version: Uuid,
    ) -> Result<User, StoreError>;

    async fn update_identity_version(
        &mut self,
        id: UserId,
        identity_version: Uuid,
    ) -> Result<(), StoreError>;

    /// Deletes the user and, by cascade, their sessions. Returns whether a
    /// row existed.
    async fn delete_user(&mut self, id: UserId) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the jti already exists.
    async fn create_session(&mut self, session: &NewRefreshSession) -> Result<(), StoreError>;

    /// Atomically removes the live session `(user_id, jti)`. Returns false if
    /// no such unexpired row existed; concurrent callers presenting the same
    /// jti see exactly one `true`.
    async fn consume_session(
        &mut self,
        user_id: UserId,
        jti: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Removes every session of the user, returning how many there were.
    async fn revoke_sessions(&mut self, user_id: UserId) -> Result<u64, StoreError>;

    /// Number of unexpired sessions held by the user.
    async fn count_live_sessions(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    /// Removes sessions whose expiry is at or before `now`.
    async fn purge_expired_sessions(&mut self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
