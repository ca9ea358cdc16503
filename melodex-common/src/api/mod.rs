//! API module for the shared HTTP contract
//!
//! Contains ONLY serde types and pure validation. Framework-specific code
//! (axum handlers, reqwest calls) lives in the server and client crates.

pub mod types;

pub use types::{
    AddFavoriteRequest, ErrorBody, ErrorResponse, FavoriteResponse, FavoritesResponse,
    HistoryResponse, MessageResponse, RecommendRequest, RecommendResponse, SearchQuery,
    TracksResponse,
};
