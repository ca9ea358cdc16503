//! # Melodex Common Library
//!
//! Shared code for the Melodex server and client crates including:
//! - Wire types for tracks, favorites and search history
//! - Request/response bodies of the HTTP API
//! - Bootstrap configuration loading
//! - Database schema initialization (behind the `sqlx` feature)

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{FavoriteSong, NewFavorite, SearchHistoryEntry, Track};
