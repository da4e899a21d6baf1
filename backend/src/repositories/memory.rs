//! In-process backend for [`AuthStore`], selected with `DATABASE_URL=memory://`.
//!
//! Transactions are serialized behind one async mutex. Each transaction works
//! on a private copy of the state and publishes it on commit, so an
//! uncommitted transaction leaves no trace.
//!
//! Beginning a transaction clones the whole state and every request waits for
//! the lock, so this backend suits tests and single-node demos only. Callers
//! keep password hashing outside of transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::store::{AuthStore, AuthTransaction, StoreError};
use crate::models::{
    refresh_session::{NewRefreshSession, RefreshSession},
    user::{NewUser, User},
};
use crate::types::UserId;
use crate::utils::time::Clock;

#[derive(Debug, Default, Clone)]
struct MemoryState {
    last_user_id: i64,
    users: BTreeMap<UserId, User>,
    sessions: HashMap<String, RefreshSession>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            clock,
        }
    }

    #[cfg(test)]
    pub(crate) fn in_transaction(&self) -> bool {
        self.state.try_lock().is_err()
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn AuthTransaction>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            clock: self.clock.clone(),
        }))
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    clock: Arc<dyn Clock>,
}

impl MemoryTransaction {
    fn user_mut(&mut self, id: UserId) -> Result<&mut User, StoreError> {
        self.working
            .users
            .get_mut(&id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }
}

#[async_trait]
impl AuthTransaction for MemoryTransaction {
    async fn find_user_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .working
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn list_users(&mut self) -> Result<Vec<User>, StoreError> {
        Ok(self.working.users.values().cloned().collect())
    }

    async fn insert_user(&mut self, new: &NewUser) -> Result<User, StoreError> {
        if self.working.users.values().any(|user| user.email == new.email) {
            return Err(StoreError::Conflict);
        }

        self.working.last_user_id += 1;
        let now = self.clock.now();
        let user = User {
            id: UserId::new(self.working.last_user_id),
            username: new.username.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            identity_version: new.identity_version,
            created_at: now,
            updated_at: now,
        };
        self.working.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_credentials(
        &mut self,
        id: UserId,
        password_hash: &str,
        identity_version: Uuid,
    ) -> Result<User, StoreError> {
        let now = self.clock.now();
        let user = self.user_mut(id)?;
        user.password_hash = password_hash.to_string();
        user.identity_version = identity_version;
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn update_identity_version(
        &mut self,
        id: UserId,
        identity_version: Uuid,
    ) -> Result<(), StoreError> {
        let now = self.clock.now();
        // Matches `UPDATE ... WHERE id = $1` touching zero rows.
        if let Some(user) = self.working.users.get_mut(&id) {
            user.identity_version = identity_version;
            user.updated_at = now;
        }
        Ok(())
    }

    async fn delete_user(&mut self, id: UserId) -> Result<bool, StoreError> {
        let existed = self.working.users.remove(&id).is_some();
        if existed {
            self.working
                .sessions
                .retain(|_, session| session.user_id != id);
        }
        Ok(existed)
    }

    async fn create_session(&mut self, new: &NewRefreshSession) -> Result<(), StoreError> {
        if !self.working.users.contains_key(&new.user_id) {
            return Err(StoreError::Internal(anyhow::anyhow!(
                "refresh session references unknown user {}",
                new.user_id
            )));
        }
        if self.working.sessions.contains_key(&new.jti) {
            return Err(StoreError::Conflict);
        }

        let session = RefreshSession {
            jti: new.jti.clone(),
            user_id: new.user_id,
            expires_at: new.expires_at,
            created_at: self.clock.now(),
        };
        self.working.sessions.insert(session.jti.clone(), session);
        Ok(())
    }

    async fn consume_session(
        &mut self,
        user_id: UserId,
        jti: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let matches = self
            .working
            .sessions
            .get(jti)
            .is_some_and(|session| session.user_id == user_id && session.is_live(now));
        if matches {
            self.working.sessions.remove(jti);
        }
        Ok(matches)
    }

    async fn revoke_sessions(&mut self, user_id: UserId) -> Result<u64, StoreError> {
        let before = self.working.sessions.len();
        self.working
            .sessions
            .retain(|_, session| session.user_id != user_id);
        Ok((before - self.working.sessions.len()) as u64)
    }

    async fn count_live_sessions(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        Ok(self
            .working
            .sessions
            .values()
            .filter(|session| session.user_id == user_id && session.is_live(now))
            .count() as i64)
    }

    async fn purge_expired_sessions(&mut self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let before = self.working.sessions.len();
        self.working.sessions.retain(|_, session| session.is_live(now));
        Ok((before - self.working.sessions.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}
