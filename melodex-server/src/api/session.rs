//! Session middleware for melodex-server
//!
//! Resolves the caller's identity from a session token and attaches it to the
//! request. Handlers never read a user id from the request body or path; they
//! take an [`AuthenticatedUser`], which only this middleware can produce.
//!
//! Token sources, in order:
//! 1. `Authorization: Bearer <token>`
//! 2. `session=<token>` cookie

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{db, ApiError, AppState};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Identity of the caller, resolved by [`session_middleware`]
///
/// Extracting this type rejects the request with 401 when no valid session
/// was resolved. Use `Option<AuthenticatedUser>` for endpoints that also
/// serve anonymous callers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user_id: String,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}

/// Resolve the session token, if any, into an [`AuthenticatedUser`]
///
/// Unknown or expired tokens leave the request anonymous and protected
/// handlers answer 401 themselves. A failed lookup is a store error (500),
/// not a missing session.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(request.headers()) {
        match db::sessions::resolve_user(&state.db, &token).await {
            Ok(Some(user_id)) => {
                request
                    .extensions_mut()
                    .insert(AuthenticatedUser { user_id });
            }
            Ok(None) => debug!("Session token not recognized or expired"),
            Err(e) => return ApiError::Database(e).into_response(),
        }
    }

    next.run(request).await
}

/// Extract the session token from the request headers
fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
