//! Recommendation records
//!
//! Stores the listener's intent, the query generated from it and the top
//! results. Written best-effort; nothing reads these rows at request time.

use melodex_common::Track;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_timestamp, now_micros};
use crate::services::recommender::RECORDED_RESULT_LIMIT;

/// Persist a recommendation with at most [`RECORDED_RESULT_LIMIT`] results
pub async fn record(
    pool: &SqlitePool,
    user_id: Option<&str>,
    prompt: &str,
    generated_query: &str,
    tracks: &[Track],
) -> melodex_common::Result<String> {
    let id = Uuid::new_v4().to_string();
    let top = &tracks[..tracks.len().min(RECORDED_RESULT_LIMIT)];
    let results = serde_json::to_string(top)
        .map_err(|e| melodex_common::Error::Internal(format!("Serialize results: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO recommendations (id, user_id, prompt, generated_query, results, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(prompt)
    .bind(generated_query)
    .bind(results)
    .bind(format_timestamp(&now_micros()))
    .execute(pool)
    .await?;

    Ok(id)
}
