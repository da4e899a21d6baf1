//! Login, refresh, logout and password change.
//!
//! Each operation commits through a single store transaction; nothing becomes
//! visible unless the whole operation succeeds. Password hashing runs between
//! a read-only lookup and that transaction, and the write re-checks that the
//! stored hash is still the one that was verified.

use std::sync::{Arc, OnceLock};

use crate::{
    models::{
        refresh_session::NewRefreshSession,
        user::{TokenPair, User},
    },
    repositories::{AuthStore, AuthTransaction},
    services::{ensure_same_actor, identity_version, AuthError},
    types::UserId,
    utils::{jwt::TokenCodec, password::CredentialStore, time::Clock},
};

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn AuthStore>,
    codec: Arc<TokenCodec>,
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    decoy_hash: Arc<OnceLock<String>>,
}

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

impl SessionManager {
    pub fn new(
        store: Arc<dyn AuthStore>,
        codec: Arc<TokenCodec>,
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            codec,
            credentials,
            clock,
            decoy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Verifies credentials and starts a new session epoch.
    ///
    /// Rotating the identity version invalidates every token issued before
    /// this login, and prior refresh sessions are deleted outright.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        // Read-only lookup; the transaction is dropped before hashing.
        let candidate = {
            let mut tx = self.store.begin().await?;
            let found = tx.find_user_by_email(email).await?;
            found
        };
        let Some(candidate) = candidate else {
            self.verify_decoy(password)?;
            tracing::warn!("Login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !self.credentials.verify(password, &candidate.password_hash)? {
            tracing::warn!(user_id = %candidate.id, "Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let mut tx = self.store.begin().await?;
        let Some(mut user) = tx
            .find_user_by_id(candidate.id)
            .await?
            .filter(|current| current.password_hash == candidate.password_hash)
        else {
            tracing::warn!(user_id = %candidate.id, "Login rejected: credentials changed meanwhile");
            return Err(AuthError::InvalidCredentials);
        };

        let version = identity_version::rotate(&mut user);
        tx.update_identity_version(user.id, version).await?;
        let revoked = tx.revoke_sessions(user.id).await?;
        let pair = self.issue_pair(tx.as_mut(), &user).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, revoked_sessions = revoked, "User logged in");
        Ok(pair)
    }

    /// Exchanges a refresh token for a new pair, consuming the old session.
    ///
    /// The identity version is kept; only the session row rotates.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .decode_refresh(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        let user_id = claims
            .user_id()
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let mut tx = self.store.begin().await?;

        let user = tx
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        if !identity_version::check(&user, &claims.version) {
            tracing::warn!(user_id = %user.id, "Refresh rejected: stale identity version");
            return Err(AuthError::InvalidRefreshToken);
        }
        if !tx
            .consume_session(user.id, &claims.jti, self.clock.now())
            .await?
        {
            tracing::warn!(user_id = %user.id, "Refresh rejected: session revoked or already used");
            return Err(AuthError::InvalidRefreshToken);
        }

        let pair = self.issue_pair(tx.as_mut(), &user).await?;
        tx.commit().await?;

        tracing::debug!(user_id = %user.id, "Refresh session rotated");
        Ok(pair)
    }

    /// Ends every session of the user: refresh rows are deleted and the
    /// identity version rotates so outstanding access tokens fail too.
    pub async fn logout(&self, user: &User) -> Result<(), AuthError> {
        let mut tx = self.store.begin().await?;

        let revoked = tx.revoke_sessions(user.id).await?;
        let mut user = user.clone();
        let version = identity_version::rotate(&mut user);
        tx.update_identity_version(user.id, version).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, revoked_sessions = revoked, "User logged out");
        Ok(())
    }

    /// Replaces the password of `target` after checking the old one.
    ///
    /// Refresh rows are left in place; the rotated identity version makes
    /// them fail on next use.
    pub async fn change_password(
        &self,
        actor: &User,
        target: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<User, AuthError> {
        ensure_same_actor(actor.id, target)?;

        let current = {
            let mut tx = self.store.begin().await?;
            let found = tx.find_user_by_id(target).await?;
            found.ok_or(AuthError::NotFound)?
        };
        if !self.credentials.verify(old_password, &current.password_hash)? {
            tracing::warn!(user_id = %current.id, "Password change rejected: old password mismatch");
            return Err(AuthError::IncorrectOldPassword);
        }
        let new_hash = self.credentials.hash(new_password)?;

        let mut tx = self.store.begin().await?;
        let mut user = tx
            .find_user_by_id(target)
            .await?
            .ok_or(AuthError::NotFound)?;
        if user.password_hash != current.password_hash {
            tracing::warn!(user_id = %user.id, "Password change rejected: password changed meanwhile");
            return Err(AuthError::IncorrectOldPassword);
        }

        let version = identity_version::rotate(&mut user);
        let updated = tx
            .update_user_credentials(user.id, &new_hash, version)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %updated.id, "Password changed; all sessions invalidated");
        Ok(updated)
    }

    /// Resolves a bearer access token to its live user.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self
            .codec
            .decode_access(access_token)
            .map_err(|_| AuthError::InvalidAccessToken)?;
        let user_id = claims
            .user_id()
            .map_err(|_| AuthError::InvalidAccessToken)?;

        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidAccessToken)?;
        if !identity_version::check(&user, &claims.version) {
            return Err(AuthError::InvalidAccessToken);
        }
        Ok(user)
    }

    /// Spends one verification on unknown emails so they cost as much as a
    /// wrong password.
    fn verify_decoy(&self, password: &str) -> Result<(), AuthError> {
        let decoy = match self.decoy_hash.get() {
            Some(hash) => hash,
            None => {
                let hash = self.credentials.hash(DECOY_PASSWORD)?;
                self.decoy_hash.get_or_init(|| hash)
            }
        };
        self.credentials.verify(password, decoy)?;
        Ok(())
    }

    async fn issue_pair(
        &self,
        tx: &mut dyn AuthTransaction,
        user: &User,
    ) -> Result<TokenPair, AuthError> {
        let version = identity_version::current(user);
        let access_token = self
            .codec
            .issue_access(user.id, &version)
            .map_err(anyhow::Error::from)?;
        let refresh = self
            .codec
            .issue_refresh(user.id, &version)
            .map_err(anyhow::Error::from)?;

        tx.create_session(&NewRefreshSession {
            jti: refresh.jti,
            user_id: user.id,
            expires_at: refresh.expires_at,
        })
        .await?;

        Ok(TokenPair::bearer(access_token, refresh.token))
    }
}
