//! Search and recommendation helpers
//!
//! Failures are reported with a fixed message per action; the underlying
//! [`SyncError`] stays available as the error source for logging.

use melodex_common::api::RecommendResponse;
use melodex_common::{SearchHistoryEntry, Track};
use thiserror::Error;
use tracing::warn;

use crate::error::SyncError;
use crate::transport::HttpTransport;

pub const SEARCH_FAILED: &str = "Failed to fetch results";
pub const RECOMMEND_FAILED: &str = "Failed to fetch AI recommendations";
pub const HISTORY_FAILED: &str = "Failed to fetch search history";

/// Failed discovery action
///
/// Displays only the fixed per-action message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DiscoveryError {
    message: &'static str,
    #[source]
    source: SyncError,
}

impl DiscoveryError {
    fn new(message: &'static str, source: SyncError) -> Self {
        warn!("{}: {}", message, source);
        Self { message, source }
    }

    /// Text safe to show to the user
    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn cause(&self) -> &SyncError {
        &self.source
    }
}

/// Outcome of a recommendation request
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    Tracks(Vec<Track>),
    /// The model's own text, when no catalog tracks matched
    Text(String),
}

impl From<RecommendResponse> for Recommendation {
    fn from(response: RecommendResponse) -> Self {
        match response {
            RecommendResponse::Tracks { tracks } => Recommendation::Tracks(tracks),
            RecommendResponse::Text { text } => Recommendation::Text(text),
        }
    }
}

/// Catalog search, AI recommendations and search history
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    transport: HttpTransport,
}

impl DiscoveryClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Search the catalog for tracks
    ///
    /// A blank query returns no tracks without calling the server.
    pub async fn search(&self, query: &str) -> Result<Vec<Track>, DiscoveryError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.transport
            .search(query, None)
            .await
            .map_err(|e| DiscoveryError::new(SEARCH_FAILED, e))
    }

    /// Ask for recommendations matching a free-text intent
    ///
    /// A blank prompt returns no tracks without calling the server.
    pub async fn recommend(&self, prompt: &str) -> Result<Recommendation, DiscoveryError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(Recommendation::Tracks(Vec::new()));
        }

        self.transport
            .recommend(prompt)
            .await
            .map(Recommendation::from)
            .map_err(|e| DiscoveryError::new(RECOMMEND_FAILED, e))
    }

    /// Recent searches of the session user, newest first
    pub async fn history(&self) -> Result<Vec<SearchHistoryEntry>, DiscoveryError> {
        self.transport
            .history()
            .await
            .map_err(|e| DiscoveryError::new(HISTORY_FAILED, e))
    }
}
