//! HTTP transport to melodex-server
//!
//! [`FavoritesTransport`] is the seam between the favorites cache and the
//! network; [`HttpTransport`] implements it with reqwest and also carries
//! the search/recommend calls used by [`crate::DiscoveryClient`].

use std::time::Duration;

use async_trait::async_trait;
use melodex_common::api::{
    AddFavoriteRequest, ErrorResponse, FavoriteResponse, FavoritesResponse, HistoryResponse,
    RecommendRequest, RecommendResponse, TracksResponse,
};
use melodex_common::{FavoriteSong, SearchHistoryEntry, Track};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{SyncError, SyncResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Server answer to an add
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Stored; carries the canonical record
    Created(FavoriteSong),
    /// The caller had already favorited this item (409)
    AlreadyExists,
}

/// Server answer to a remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// Nothing owned by the caller had that id (404)
    NotFound,
}

/// Favorites endpoints as seen by the client cache
#[async_trait]
pub trait FavoritesTransport: Send + Sync {
    /// `GET /favorites`
    async fn list(&self) -> SyncResult<Vec<FavoriteSong>>;

    /// `POST /favorites`
    async fn add(&self, request: &AddFavoriteRequest) -> SyncResult<AddOutcome>;

    /// `DELETE /favorites/{id}`
    async fn remove(&self, favorite_id: &str) -> SyncResult<RemoveOutcome>;
}

/// reqwest-based client bound to one server and one session token
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Anonymous transport; favorites calls will fail with `Unauthenticated`
    pub fn new(base_url: impl Into<String>) -> SyncResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Transport that authenticates with `token`
    pub fn with_session(base_url: impl Into<String>, token: impl Into<String>) -> SyncResult<Self> {
        let mut transport = Self::new(base_url)?;
        transport.token = Some(token.into());
        Ok(transport)
    }

    /// `GET /search`
    pub async fn search(&self, query: &str, result_type: Option<&str>) -> SyncResult<Vec<Track>> {
        let mut params = vec![("q", query)];
        if let Some(result_type) = result_type {
            params.push(("type", result_type));
        }

        let response = self
            .request(self.client.get(self.url("/search")).query(&params))
            .await?;
        let body: TracksResponse = decode(expect_success(response).await?).await?;
        Ok(body.tracks)
    }

    /// `POST /recommend`
    pub async fn recommend(&self, prompt: &str) -> SyncResult<RecommendResponse> {
        let body = RecommendRequest {
            prompt: Some(prompt.to_string()),
        };
        let response = self
            .request(self.client.post(self.url("/recommend")).json(&body))
            .await?;
        decode(expect_success(response).await?).await
    }

    /// `GET /search/history`
    pub async fn history(&self) -> SyncResult<Vec<SearchHistoryEntry>> {
        let response = self
            .request(self.client.get(self.url("/search/history")))
            .await?;
        let body: HistoryResponse = decode(expect_success(response).await?).await?;
        Ok(body.history)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/favorites/{id}` with `favorite_id` encoded as one path segment
    fn favorite_url(&self, favorite_id: &str) -> SyncResult<Url> {
        let invalid = || SyncError::Transport(format!("Invalid server URL: {}", self.base_url));

        let mut url = Url::parse(&self.url("/favorites")).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .push(favorite_id);
        Ok(url)
    }

    async fn request(&self, builder: RequestBuilder) -> SyncResult<Response> {
        let builder = match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        Ok(builder.send().await?)
    }
}

#[async_trait]
impl FavoritesTransport for HttpTransport {
    async fn list(&self) -> SyncResult<Vec<FavoriteSong>> {
        let response = self.request(self.client.get(self.url("/favorites"))).await?;
        let body: FavoritesResponse = decode(expect_success(response).await?).await?;
        Ok(body.favorites)
    }

    async fn add(&self, request: &AddFavoriteRequest) -> SyncResult<AddOutcome> {
        let response = self
            .request(self.client.post(self.url("/favorites")).json(request))
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Ok(AddOutcome::AlreadyExists);
        }

        let body: FavoriteResponse = decode(expect_success(response).await?).await?;
        Ok(AddOutcome::Created(body.favorite))
    }

    async fn remove(&self, favorite_id: &str) -> SyncResult<RemoveOutcome> {
        let url = self.favorite_url(favorite_id)?;
        let response = self.request(self.client.delete(url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(RemoveOutcome::NotFound);
        }

        expect_success(response).await?;
        Ok(RemoveOutcome::Removed)
    }
}

/// Map non-success statuses to [`SyncError`]
async fn expect_success(response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(SyncError::Unauthenticated);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error.message)
        .unwrap_or(text);

    Err(SyncError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> SyncResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| SyncError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_id_is_one_path_segment() {
        let transport = HttpTransport::new("http://localhost:5780/").unwrap();

        let url = transport.favorite_url("a/b c?d#e").unwrap();

        assert_eq!(url.as_str(), "http://localhost:5780/favorites/a%2Fb%20c%3Fd%23e");
    }

    #[test]
    fn test_favorite_url_keeps_base_path() {
        let transport = HttpTransport::new("http://localhost:5780/api").unwrap();

        let url = transport.favorite_url("9f1c").unwrap();

        assert_eq!(url.as_str(), "http://localhost:5780/api/favorites/9f1c");
    }

    #[test]
    fn test_unparseable_base_url_is_transport_error() {
        let transport = HttpTransport::new("not a url").unwrap();

        assert!(matches!(
            transport.favorite_url("f1"),
            Err(SyncError::Transport(_))
        ));
    }
}
