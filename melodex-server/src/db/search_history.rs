//! Search history persistence

use melodex_common::SearchHistoryEntry;
use sqlx::SqlitePool;

use super::{format_timestamp, now_micros};

/// Number of entries returned by the history endpoint
pub const RECENT_HISTORY_LIMIT: i64 = 20;

/// Record a search performed by `user_id`
pub async fn record(
    pool: &SqlitePool,
    user_id: &str,
    query: &str,
    result_type: &str,
) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO search_history (user_id, query, result_type, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(query)
    .bind(result_type)
    .bind(format_timestamp(&now_micros()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent searches of `user_id`, newest first
pub async fn recent_for_user(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> sqlx::Result<Vec<SearchHistoryEntry>> {
    sqlx::query_as::<_, SearchHistoryEntry>(
        r#"
        SELECT user_id, query, result_type, created_at
        FROM search_history
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[tokio::test]
    async fn test_recent_history_is_per_user_and_limited() {
        let pool = connect_in_memory().await.unwrap();

        for i in 0..3 {
            record(&pool, "alice", &format!("query {}", i), "track").await.unwrap();
        }
        record(&pool, "bob", "other", "album").await.unwrap();

        let history = recent_for_user(&pool, "alice", 2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "query 2");
        assert_eq!(history[1].query, "query 1");
        assert!(history.iter().all(|h| h.user_id.as_deref() == Some("alice")));
    }
}
