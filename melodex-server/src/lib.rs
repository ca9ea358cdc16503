//! melodex-server library - music discovery service
//!
//! Catalog search, AI recommendations and per-user favorites over HTTP.

use std::sync::Arc;

use axum::{middleware, Router};
use melodex_common::config::Environment;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

use services::{CatalogGateway, CompletionGateway};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Music catalog search
    pub catalog: Arc<dyn CatalogGateway>,
    /// Completion model used for recommendations
    pub completion: Arc<dyn CompletionGateway>,
    /// Controls how much upstream error detail reaches clients
    pub environment: Environment,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        catalog: Arc<dyn CatalogGateway>,
        completion: Arc<dyn CompletionGateway>,
        environment: Environment,
    ) -> Self {
        Self {
            db,
            catalog,
            completion,
            environment,
        }
    }
}

/// Build application router
///
/// Every route sits behind the session middleware, which only attaches an
/// identity; each handler decides whether it requires one.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::search_routes())
        .merge(api::recommend_routes())
        .merge(api::favorites_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
