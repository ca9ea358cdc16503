//! HTTP API handlers for melodex-server

pub mod favorites;
pub mod health;
pub mod recommend;
pub mod search;
pub mod session;

pub use favorites::favorites_routes;
pub use health::health_routes;
pub use recommend::recommend_routes;
pub use search::search_routes;
pub use session::{session_middleware, AuthenticatedUser};
