//! Session registry queries over the `refresh_sessions` table.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::models::refresh_session::NewRefreshSession;
use crate::types::UserId;

pub async fn create_session(
    conn: &mut PgConnection,
    session: &NewRefreshSession,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO refresh_sessions (jti, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(&session.jti)
        .bind(session.user_id)
        .bind(session.expires_at)
        .execute(conn)
        .await
        .map(|_| ())
}

/// Compare-and-delete of one live session.
///
/// The row lock taken by `DELETE` makes a concurrent redemption of the same
/// jti wait for this transaction and then match zero rows.
pub async fn consume_session(
    conn: &mut PgConnection,
    user_id: UserId,
    jti: &str,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM refresh_sessions WHERE jti = $1 AND user_id = $2 AND expires_at > $3",
    )
    .bind(jti)
    .bind(user_id)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn revoke_sessions_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM refresh_sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_live_sessions(
    conn: &mut PgConnection,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM refresh_sessions WHERE user_id = $1 AND expires_at > $2",
    )
    .bind(user_id)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn purge_expired_sessions(
    conn: &mut PgConnection,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM refresh_sessions WHERE expires_at <= $1")
        .bind(now)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
