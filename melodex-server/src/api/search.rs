//! Catalog search endpoints
//!
//! - `GET /search?q=...&type=...`: keyword search, open to anonymous callers
//! - `GET /search/history`: caller's recent searches

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use melodex_common::api::{HistoryResponse, SearchQuery, TracksResponse};
use tracing::{debug, warn};

use crate::api::session::AuthenticatedUser;
use crate::db::search_history::{self, RECENT_HISTORY_LIMIT};
use crate::{ApiError, ApiResult, AppState};

/// Result type used when the request does not name one
pub const DEFAULT_RESULT_TYPE: &str = "track";

/// Build search routes
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/search/history", get(search_history))
}

/// GET /search
///
/// Authenticated searches are appended to the caller's history after the
/// response is produced; a failed history write is logged and otherwise
/// ignored.
pub async fn search(
    user: Option<AuthenticatedUser>,
    State(state): State<AppState>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<TracksResponse>> {
    let Query(params) =
        params.map_err(|e| ApiError::BadRequest(format!("Invalid query: {}", e.body_text())))?;

    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing search query".to_string()))?
        .to_string();

    let result_type = params
        .result_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_RESULT_TYPE)
        .to_string();

    let tracks = state
        .catalog
        .search(&query, &result_type)
        .await
        .map_err(|e| ApiError::upstream(e, state.environment))?;

    debug!(query = %query, result_type = %result_type, count = tracks.len(), "Catalog search");

    if let Some(user) = user {
        let pool = state.db.clone();
        tokio::spawn(async move {
            if let Err(e) = search_history::record(&pool, user.user_id(), &query, &result_type).await {
                warn!("Failed to record search history: {}", e);
            }
        });
    }

    Ok(Json(TracksResponse { tracks }))
}

/// GET /search/history
pub async fn search_history(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> ApiResult<Json<HistoryResponse>> {
    let history =
        search_history::recent_for_user(&state.db, user.user_id(), RECENT_HISTORY_LIMIT).await?;

    Ok(Json(HistoryResponse { history }))
}
