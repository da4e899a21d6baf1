use std::sync::Arc;

use uuid::Uuid;

use crate::{
    models::user::{NewUser, RegisterUser, User, UserResponse},
    repositories::{AuthStore, StoreError},
    services::{ensure_same_actor, AuthError},
    types::UserId,
    utils::password::CredentialStore,
};

/// Account registration, lookup and deletion.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn AuthStore>,
    credentials: Arc<dyn CredentialStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn AuthStore>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { store, credentials }
    }

    /// Creates an account. No tokens are issued; the caller logs in next.
    pub async fn register(&self, payload: RegisterUser) -> Result<UserResponse, AuthError> {
        let password_hash = self.credentials.hash(&payload.password)?;

        let mut tx = self.store.begin().await?;

        if tx.find_user_by_email(&payload.email).await?.is_some() {
            return Err(AuthError::Conflict);
        }

        let new_user = NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
            identity_version: Uuid::new_v4(),
        };
        // A concurrent registration can still win the unique index.
        let user = tx.insert_user(&new_user).await.map_err(|err| match err {
            StoreError::Conflict => AuthError::Conflict,
            other => other.into(),
        })?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }

    pub async fn list(&self) -> Result<Vec<UserResponse>, AuthError> {
        let mut tx = self.store.begin().await?;
        let users = tx.list_users().await?;
        Ok(users.iter().map(UserResponse::from).collect())
    }

    pub async fn get(&self, id: UserId) -> Result<UserResponse, AuthError> {
        let mut tx = self.store.begin().await?;
        tx.find_user_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::NotFound)
    }

    /// Removes the actor's own account; its refresh sessions go with it.
    pub async fn delete(&self, actor: &User, id: UserId) -> Result<(), AuthError> {
        ensure_same_actor(actor.id, id)?;

        let mut tx = self.store.begin().await?;
        if !tx.delete_user(id).await? {
            return Err(AuthError::NotFound);
        }
        tx.commit().await?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repositories::MemoryStore,
        utils::{password::Argon2Credentials, time::ManualClock},
    };

    fn service() -> (UserService, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemoryStore::new(clock));
        let credentials = Arc::new(Argon2Credentials::with_params(8, 1, 1).expect("params"));
        (UserService::new(store.clone(), credentials), store)
    }

    fn registration(username: &str, email: &str) -> RegisterUser {
        RegisterUser {
            username: username.into(),
            email: email.into(),
            password: "secret123".into(),
        }
    }

    async fn stored(store: &MemoryStore, id: UserId) -> User {
        let mut tx = store.begin().await.unwrap();
        tx.find_user_by_id(id).await.unwrap().expect("user exists")
    }

    #[tokio::test]
    async fn register_hashes_password_and_hides_it() {
        let (service, store) = service();
        let created = service
            .register(registration("alice", "a@x.com"))
            .await
            .unwrap();
        assert_eq!(created.username, "alice");
        assert_eq!(created.email, "a@x.com");

        let user = stored(&store, created.id).await;
        assert_ne!(user.password_hash, "secret123");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (service, _) = service();
        service
            .register(registration("alice", "a@x.com"))
            .await
            .unwrap();
        let err = service
            .register(registration("other", "a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
    }

    #[tokio::test]
    async fn duplicate_username_is_allowed() {
        let (service, _) = service();
        service
            .register(registration("alice", "a@x.com"))
            .await
            .unwrap();
        assert!(service
            .register(registration("alice", "b@x.com"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn list_and_get() {
        let (service, _) = service();
        let a = service
            .register(registration("alice", "a@x.com"))
            .await
            .unwrap();
        let b = service
            .register(registration("bob", "b@x.com"))
            .await
            .unwrap();

        let all = service.list().await.unwrap();
        assert_eq!(all.iter().map(|u| u.id).collect::<Vec<_>>(), vec![a.id, b.id]);
        assert_eq!(service.get(b.id).await.unwrap().username, "bob");
        assert!(matches!(
            service.get(UserId::new(42)).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_requires_the_owner() {
        let (service, store) = service();
        let a = service
            .register(registration("alice", "a@x.com"))
            .await
            .unwrap();
        let b = service
            .register(registration("bob", "b@x.com"))
            .await
            .unwrap();
        let alice = stored(&store, a.id).await;

        assert!(matches!(
            service.delete(&alice, b.id).await,
            Err(AuthError::Forbidden)
        ));
        service.delete(&alice, a.id).await.unwrap();
        assert!(matches!(service.get(a.id).await, Err(AuthError::NotFound)));
        assert!(matches!(
            service.delete(&alice, a.id).await,
            Err(AuthError::NotFound)
        ));
    }
}
