//! Database access layer for melodex-server
//!
//! Every query that touches user-owned rows is scoped by `user_id`.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

pub mod favorites;
pub mod recommendations;
pub mod search_history;
pub mod sessions;

/// Open the database file and apply the schema
pub async fn connect(db_path: &Path) -> melodex_common::Result<SqlitePool> {
    melodex_common::db::init_database(db_path).await
}

/// In-memory database with the full schema
///
/// Uses a single long-lived connection: every SQLite `:memory:` connection is
/// a separate database.
pub async fn connect_in_memory() -> melodex_common::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    melodex_common::db::create_schema(&pool).await?;
    Ok(pool)
}

/// Current time at the precision stored in the database
pub(crate) fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width UTC timestamp so that TEXT ordering matches time ordering
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_schema_is_shared_across_queries() {
        let pool = connect_in_memory().await.unwrap();

        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ('t', 'u')")
            .execute(&pool)
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_timestamps_are_fixed_width() {
        let ts = format_timestamp(&now_micros());

        assert_eq!(ts.len(), "2026-01-01T00:00:00.000000Z".len());
        assert!(ts.ends_with('Z'));
    }
}
