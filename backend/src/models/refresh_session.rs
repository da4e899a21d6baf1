//! Models for tracking live refresh sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of one issued refresh token.
pub struct RefreshSession {
    /// Session identifier embedded in the refresh token as `jti`.
    pub jti: String,
    /// Owner of the session.
    pub user_id: UserId,
    /// After this instant the session counts as absent even if still stored.
    pub expires_at: DateTime<Utc>,
    /// Timestamp when the session was created.
    pub created_at: DateTime<Utc>,
}

impl RefreshSession {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone)]
/// Values required to record a newly issued refresh token.
pub struct NewRefreshSession {
    pub jti: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}
