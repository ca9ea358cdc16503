//! Domain records shared by the server and client
//!
//! JSON field names are camelCase on the wire (`spotifyId`, `albumArt`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Track as returned by the search and recommend endpoints
///
/// `id` is the catalog's own identifier, not a store identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    /// Artist names joined with ", "
    pub artists: String,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub external_url: String,
}

/// Persisted favorite record
///
/// `id` is assigned by the store and is distinct from `spotify_id`.
/// The pair (`user_id`, `spotify_id`) is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct FavoriteSong {
    pub id: String,
    pub user_id: String,
    pub spotify_id: String,
    pub name: String,
    pub artists: String,
    pub album: String,
    #[serde(default)]
    pub album_art: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    pub external_url: String,
    pub created_at: DateTime<Utc>,
}

/// Denormalized song metadata submitted when favoriting a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFavorite {
    pub spotify_id: String,
    pub name: String,
    pub artists: String,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub external_url: String,
}

impl From<&Track> for NewFavorite {
    fn from(track: &Track) -> Self {
        Self {
            spotify_id: track.id.clone(),
            name: track.name.clone(),
            artists: track.artists.clone(),
            album: track.album.clone(),
            album_art: track.album_art.clone(),
            preview_url: track.preview_url.clone(),
            external_url: track.external_url.clone(),
        }
    }
}

/// Search history entry
///
/// Only searches by authenticated users are persisted. The owner is not
/// echoed back to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    #[serde(skip)]
    pub user_id: Option<String>,
    pub query: String,
    #[serde(rename = "type")]
    pub result_type: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_track() -> Track {
        Track {
            id: "T1".to_string(),
            name: "Song A".to_string(),
            artists: "Artist X".to_string(),
            album: "Album Y".to_string(),
            album_art: None,
            preview_url: Some("https://p.scdn.co/mp3-preview/T1".to_string()),
            external_url: "https://open.spotify.com/track/T1".to_string(),
        }
    }

    #[test]
    fn test_track_serializes_camel_case_and_skips_missing_art() {
        let json = serde_json::to_value(sample_track()).unwrap();

        assert_eq!(json["externalUrl"], "https://open.spotify.com/track/T1");
        assert_eq!(json["previewUrl"], "https://p.scdn.co/mp3-preview/T1");
        assert!(json.get("albumArt").is_none());
    }

    #[test]
    fn test_new_favorite_from_track_uses_catalog_id() {
        let favorite = NewFavorite::from(&sample_track());

        assert_eq!(favorite.spotify_id, "T1");
        assert_eq!(favorite.external_url, "https://open.spotify.com/track/T1");
    }

    #[test]
    fn test_history_entry_hides_owner_and_renames_type() {
        let entry = SearchHistoryEntry {
            user_id: Some("user-1".to_string()),
            query: "lofi".to_string(),
            result_type: "track".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "track");
        assert!(json.get("userId").is_none());
        assert!(json["createdAt"].is_string());
    }
}
