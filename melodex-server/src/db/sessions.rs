//! Session lookup
//!
//! Sessions are issued by the external authentication provider, which writes
//! rows into `sessions`. This service only resolves tokens to user ids.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::format_timestamp;

/// Resolve a session token to its user id
///
/// Returns `None` for unknown or expired tokens.
pub async fn resolve_user(pool: &SqlitePool, token: &str) -> sqlx::Result<Option<String>> {
    let row: Option<(String, Option<DateTime<Utc>>)> =
        sqlx::query_as("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;

    Ok(row.and_then(|(user_id, expires_at)| match expires_at {
        Some(expiry) if expiry <= Utc::now() => None,
        _ => Some(user_id),
    }))
}

/// Register a session token for `user_id`
///
/// Used by auth-provider integrations and tests.
pub async fn insert(
    pool: &SqlitePool,
    token: &str,
    user_id: &str,
    expires_at: Option<DateTime<Utc>>,
) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at.as_ref().map(format_timestamp))
        .execute(pool)
        .await?;

    Ok(())
}
