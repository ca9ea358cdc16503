//! Favorites endpoints
//!
//! - `GET /favorites`: caller's favorites, newest first
//! - `POST /favorites`: add a favorite (409 on duplicate)
//! - `DELETE /favorites/:id`: remove a favorite owned by the caller
//!
//! The caller identity always comes from the session, never from the request.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get},
    Json, Router,
};
use melodex_common::api::{AddFavoriteRequest, FavoriteResponse, FavoritesResponse, MessageResponse};
use tracing::{debug, info};

use crate::api::session::AuthenticatedUser;
use crate::db::favorites::{self, InsertOutcome};
use crate::{ApiError, ApiResult, AppState};

/// Build favorites routes
pub fn favorites_routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route("/favorites/:id", delete(remove_favorite))
}

/// GET /favorites
pub async fn list_favorites(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> ApiResult<Json<FavoritesResponse>> {
    let favorites = favorites::list_for_user(&state.db, user.user_id()).await?;

    debug!(user_id = user.user_id(), count = favorites.len(), "Listed favorites");

    Ok(Json(FavoritesResponse { favorites }))
}

/// POST /favorites
///
/// **Request:** `{spotifyId, name, artists, album, albumArt?, previewUrl?, externalUrl}`
/// **Response:** `{favorite}` with the store-assigned id
///
/// **Errors:**
/// - 400 Bad Request: missing required field or malformed JSON
/// - 401 Unauthorized: no valid session
/// - 409 Conflict: the caller already favorited this catalog item
pub async fn add_favorite(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    payload: Result<Json<AddFavoriteRequest>, JsonRejection>,
) -> ApiResult<Json<FavoriteResponse>> {
    let Json(request) =
        payload.map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    let song = request.validate()?;

    match favorites::insert(&state.db, user.user_id(), &song).await? {
        InsertOutcome::Created(favorite) => {
            info!(
                user_id = user.user_id(),
                spotify_id = %favorite.spotify_id,
                favorite_id = %favorite.id,
                "Favorite added"
            );
            Ok(Json(FavoriteResponse { favorite }))
        }
        InsertOutcome::Duplicate => {
            debug!(
                user_id = user.user_id(),
                spotify_id = %song.spotify_id,
                "Favorite already exists"
            );
            Err(ApiError::Conflict("Song already in favorites".to_string()))
        }
    }
}

/// DELETE /favorites/:id
///
/// Deletes at most one record matching both the id and the caller. A record
/// owned by someone else is indistinguishable from a missing one (404).
pub async fn remove_favorite(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = favorites::delete_owned(&state.db, &id, user.user_id()).await?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Favorite not found".to_string()));
    }

    info!(user_id = user.user_id(), favorite_id = %id, "Favorite removed");

    Ok(Json(MessageResponse {
        message: "Favorite removed successfully".to_string(),
    }))
}
