//! Shared API request/response types
//!
//! Used by `melodex-server` to produce responses and by `melodex-client` to
//! decode them.

use serde::{Deserialize, Serialize};

use crate::models::{FavoriteSong, NewFavorite, SearchHistoryEntry, Track};
use crate::{Error, Result};

// ========================================
// Favorites
// ========================================

/// Body of `POST /favorites`
///
/// Every field is optional at the serde level so that missing fields surface
/// as a validation error instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub spotify_id: Option<String>,
    pub name: Option<String>,
    pub artists: Option<String>,
    pub album: Option<String>,
    pub album_art: Option<String>,
    pub preview_url: Option<String>,
    pub external_url: Option<String>,
}

impl AddFavoriteRequest {
    /// Validate required fields and convert into a [`NewFavorite`]
    ///
    /// Absent and empty values both count as missing; values are otherwise
    /// stored as sent. Empty optional URLs are normalized to `None`.
    pub fn validate(self) -> Result<NewFavorite> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        let spotify_id = present(self.spotify_id);
        let name = present(self.name);
        let artists = present(self.artists);
        let album = present(self.album);
        let external_url = present(self.external_url);

        let mut missing = Vec::new();
        if spotify_id.is_none() {
            missing.push("spotifyId");
        }
        if name.is_none() {
            missing.push("name");
        }
        if artists.is_none() {
            missing.push("artists");
        }
        if album.is_none() {
            missing.push("album");
        }
        if external_url.is_none() {
            missing.push("externalUrl");
        }

        match (spotify_id, name, artists, album, external_url) {
            (Some(spotify_id), Some(name), Some(artists), Some(album), Some(external_url)) => {
                Ok(NewFavorite {
                    spotify_id,
                    name,
                    artists,
                    album,
                    album_art: present(self.album_art),
                    preview_url: present(self.preview_url),
                    external_url,
                })
            }
            _ => Err(Error::InvalidInput(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

impl From<NewFavorite> for AddFavoriteRequest {
    fn from(song: NewFavorite) -> Self {
        Self {
            spotify_id: Some(song.spotify_id),
            name: Some(song.name),
            artists: Some(song.artists),
            album: Some(song.album),
            album_art: song.album_art,
            preview_url: song.preview_url,
            external_url: Some(song.external_url),
        }
    }
}

/// Response of `GET /favorites`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<FavoriteSong>,
}

/// Response of a successful `POST /favorites`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FavoriteResponse {
    pub favorite: FavoriteSong,
}

/// Generic confirmation body (e.g. `DELETE /favorites/{id}`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ========================================
// Search & Recommendations
// ========================================

/// Query string of `GET /search`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub result_type: Option<String>,
}

/// Response of `GET /search`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TracksResponse {
    pub tracks: Vec<Track>,
}

/// Response of `GET /search/history`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<SearchHistoryEntry>,
}

/// Body of `POST /recommend`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecommendRequest {
    pub prompt: Option<String>,
}

/// Response of `POST /recommend`
///
/// Tracks are preferred; the raw model text is returned when no catalog
/// results could be produced from it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RecommendResponse {
    Tracks { tracks: Vec<Track> },
    Text { text: String },
}

// ========================================
// Error Response Types
// ========================================

/// Error envelope returned by every failing endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error code and user-facing message
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    /// Stable error code (`UNAUTHENTICATED`, `CONFLICT`, ...)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Set for transient upstream failures that may succeed on retry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

// ========================================
// Tests
// ========================================
