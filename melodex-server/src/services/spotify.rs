//! Spotify Web API catalog client
//!
//! Uses the client-credentials flow: the service credentials are exchanged for
//! a bearer token at the accounts endpoint, then `/search` is queried with it.
//!
//! # Token caching
//! With `cache_token` enabled the token is reused until shortly before its
//! advertised expiry. Concurrent searches share one refresh because the cache
//! lock is held across the exchange. With caching disabled every search
//! re-authenticates.
//!
//! # API Reference
//! - Token: https://accounts.spotify.com/api/token
//! - Search: https://api.spotify.com/v1/search

use async_trait::async_trait;
use melodex_common::config::CatalogConfig;
use melodex_common::Track;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::{CatalogGateway, GatewayError};

/// Maximum number of results requested per search
pub const SEARCH_LIMIT: u32 = 10;

/// Refresh the cached token this long before it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Spotify catalog client
pub struct SpotifyCatalog {
    http_client: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: String,
    api_url: String,
    /// `None` when token caching is disabled
    token_cache: Option<Mutex<Option<CachedToken>>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl SpotifyCatalog {
    /// Build a client from configuration
    ///
    /// Missing credentials are not an error here; searches fail with
    /// [`GatewayError::NotConfigured`] instead.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_url: config.token_url.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token_cache: config.cache_token.then(|| Mutex::new(None)),
        })
    }

    /// Whether client credentials are present
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let Some(cache) = &self.token_cache else {
            return Ok(self.request_token().await?.access_token);
        };

        let mut cached = cache.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.request_token().await?;
        let token = CachedToken {
            access_token: fresh.access_token,
            expires_at: Instant::now() + Duration::from_secs(fresh.expires_in),
        };
        let access_token = token.access_token.clone();
        *cached = Some(token);

        Ok(access_token)
    }

    async fn request_token(&self) -> Result<TokenResponse, GatewayError> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(GatewayError::NotConfigured(
                "Spotify client credentials are not set".to_string(),
            ));
        };

        debug!("Requesting Spotify access token");

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest("Spotify token request failed", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| GatewayError::Parse(format!("Failed to parse Spotify token: {}", e)))
    }
}

#[async_trait]
impl CatalogGateway for SpotifyCatalog {
    async fn search(&self, query: &str, result_type: &str) -> Result<Vec<Track>, GatewayError> {
        let access_token = self.access_token().await?;
        let limit = SEARCH_LIMIT.to_string();

        debug!(query = query, result_type = result_type, "Searching Spotify catalog");

        let response = self
            .http_client
            .get(format!("{}/search", self.api_url))
            .bearer_auth(access_token)
            .query(&[("q", query), ("type", result_type), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest("Spotify search request failed", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(format!("Failed to parse Spotify search: {}", e)))?;

        Ok(map_search_response(search))
    }
}

/// Map the catalog's native search shape into [`Track`]s
fn map_search_response(search: SearchResponse) -> Vec<Track> {
    search
        .tracks
        .map(|page| page.items)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(map_track)
        .collect()
}

fn map_track(track: SpotifyTrack) -> Track {
    let artists = track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let external_url = track
        .external_urls
        .spotify
        .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", track.id));

    Track {
        id: track.id,
        name: track.name,
        artists,
        album: track.album.name,
        album_art: track.album.images.into_iter().next().map(|i| i.url),
        preview_url: track.preview_url,
        external_url,
    }
}

// ============================================================================
// Spotify response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tracks: Option<Paging<SpotifyTrack>>,
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    /// Spotify occasionally returns `null` entries
    #[serde(default = "Vec::new")]
    items: Vec<Option<T>>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    album: SpotifyAlbum,
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    name: String,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_search_response() {
        let json = r#"{
            "tracks": {
                "items": [
                    {
                        "id": "T1",
                        "name": "Song A",
                        "artists": [{"name": "Artist X"}, {"name": "Artist Z"}],
                        "album": {
                            "name": "Album Y",
                            "images": [{"url": "https://i.scdn.co/image/large"}, {"url": "https://i.scdn.co/image/small"}]
                        },
                        "preview_url": null,
                        "external_urls": {"spotify": "https://open.spotify.com/track/T1"}
                    },
                    null
                ]
            }
        }"#;

        let search: SearchResponse = serde_json::from_str(json).unwrap();
        let tracks = map_search_response(search);

        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.id, "T1");
        assert_eq!(track.artists, "Artist X, Artist Z");
        assert_eq!(track.album_art.as_deref(), Some("https://i.scdn.co/image/large"));
        assert_eq!(track.preview_url, None);
        assert_eq!(track.external_url, "https://open.spotify.com/track/T1");
    }

    #[test]
    fn test_non_track_search_maps_to_empty() {
        let search: SearchResponse =
            serde_json::from_str(r#"{"albums": {"items": []}}"#).unwrap();

        assert!(map_search_response(search).is_empty());
    }

    #[test]
    fn test_missing_external_url_falls_back_to_track_link() {
        let json = r#"{"id": "T9", "name": "N", "artists": [], "album": {"name": "A"}}"#;
        let track = map_track(serde_json::from_str(json).unwrap());

        assert_eq!(track.external_url, "https://open.spotify.com/track/T9");
        assert_eq!(track.album_art, None);
    }

    #[tokio::test]
    async fn test_search_without_credentials_is_not_configured() {
        let catalog = SpotifyCatalog::from_config(&CatalogConfig::default()).unwrap();
        assert!(!catalog.is_configured());

        let result = catalog.search("lofi", "track").await;
        assert!(matches!(result, Err(GatewayError::NotConfigured(_))));
    }
}
