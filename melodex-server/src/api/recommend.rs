//! AI recommendation endpoint
//!
//! `POST /recommend` turns a free-text intent into a catalog query with the
//! completion model, searches the catalog with it and returns the tracks.
//! When the catalog yields nothing usable the model's text is returned
//! instead.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use melodex_common::api::{RecommendRequest, RecommendResponse};
use melodex_common::Track;
use tracing::{debug, info, warn};

use crate::api::search::DEFAULT_RESULT_TYPE;
use crate::api::session::AuthenticatedUser;
use crate::db::recommendations;
use crate::services::recommender::{build_query_prompt, normalize_query};
use crate::{ApiError, ApiResult, AppState};

/// Build recommendation routes
pub fn recommend_routes() -> Router<AppState> {
    Router::new().route("/recommend", post(recommend))
}

/// POST /recommend
///
/// **Request:** `{prompt}`
/// **Response:** `{tracks}` or, when the catalog search fails or is empty,
/// `{text}` with the model's answer
///
/// **Errors:**
/// - 400 Bad Request: prompt missing or blank
/// - 500 Internal Server Error: completion model failure
pub async fn recommend(
    user: Option<AuthenticatedUser>,
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> ApiResult<Json<RecommendResponse>> {
    let Json(request) =
        payload.map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    let prompt = request
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Prompt is required.".to_string()))?
        .to_string();

    let generated = state
        .completion
        .complete(&build_query_prompt(&prompt))
        .await
        .map_err(|e| ApiError::upstream(e, state.environment))?;

    let Some(query) = normalize_query(&generated) else {
        warn!("Completion model returned no usable query");
        spawn_record(&state, user.as_ref(), prompt, generated.clone(), Vec::new());
        return Ok(Json(RecommendResponse::Text { text: generated }));
    };

    debug!(prompt = %prompt, query = %query, "Generated catalog query");

    let tracks = match state.catalog.search(&query, DEFAULT_RESULT_TYPE).await {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!("Catalog search for recommendation failed: {}", e);
            Vec::new()
        }
    };

    spawn_record(&state, user.as_ref(), prompt, query, tracks.clone());

    if tracks.is_empty() {
        info!("No catalog results for generated query, returning model text");
        return Ok(Json(RecommendResponse::Text { text: generated }));
    }

    Ok(Json(RecommendResponse::Tracks { tracks }))
}

/// Persist the recommendation in the background
fn spawn_record(
    state: &AppState,
    user: Option<&AuthenticatedUser>,
    prompt: String,
    generated_query: String,
    tracks: Vec<Track>,
) {
    let pool = state.db.clone();
    let user_id = user.map(|u| u.user_id().to_string());

    tokio::spawn(async move {
        if let Err(e) =
            recommendations::record(&pool, user_id.as_deref(), &prompt, &generated_query, &tracks)
                .await
        {
            warn!("Failed to record recommendation: {}", e);
        }
    });
}
