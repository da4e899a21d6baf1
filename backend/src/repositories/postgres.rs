//! PostgreSQL backend for [`AuthStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{
    session,
    store::{AuthStore, AuthTransaction, StoreError},
    user as user_repo,
};
use crate::db::connection::DbPool;
use crate::models::{
    refresh_session::NewRefreshSession,
    user::{NewUser, User},
};
use crate::types::UserId;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn AuthTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgAuthTransaction { tx }))
    }
}

/// Rolls back on drop unless committed.
pub struct PgAuthTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AuthTransaction for PgAuthTransaction {
    async fn find_user_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(user_repo::find_user_by_id(&mut self.tx, id).await?)
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(user_repo::find_user_by_email(&mut self.tx, email).await?)
    }

    async fn list_users(&mut self) -> Result<Vec<User>, StoreError> {
        Ok(user_repo::list_users(&mut self.tx).await?)
    }

    async fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError> {
        Ok(user_repo::insert_user(&mut self.tx, user).await?)
    }

    async fn update_user_credentials(
        &mut self,
        id: UserId,
        password_hash: &str,
        identity_version: Uuid,
    ) -> Result<User, StoreError> {
        Ok(
            user_repo::update_user_credentials(&mut self.tx, id, password_hash, identity_version)
                .await?,
        )
    }

    async fn update_identity_version(
        &mut self,
        id: UserId,
        identity_version: Uuid,
    ) -> Result<(), StoreError> {
        Ok(user_repo::update_identity_version(&mut self.tx, id, identity_version).await?)
    }

    async fn delete_user(&mut self, id: UserId) -> Result<bool, StoreError> {
        Ok(user_repo::delete_user(&mut self.tx, id).await?)
    }

    async fn create_session(&mut self, new: &NewRefreshSession) -> Result<(), StoreError> {
        Ok(session::create_session(&mut self.tx, new).await?)
    }

    async fn consume_session(
        &mut self,
        user_id: UserId,
        jti: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(session::consume_session(&mut self.tx, user_id, jti, now).await?)
    }

    async fn revoke_sessions(&mut self, user_id: UserId) -> Result<u64, StoreError> {
        Ok(session::revoke_sessions_for_user(&mut self.tx, user_id).await?)
    }

    async fn count_live_sessions(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        Ok(session::count_live_sessions(&mut self.tx, user_id, now).await?)
    }

    async fn purge_expired_sessions(&mut self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(session::purge_expired_sessions(&mut self.tx, now).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        Ok(self.tx.commit().await?)
    }
}
