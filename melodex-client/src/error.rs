//! Error types for melodex-client

use thiserror::Error;

/// Failure of a client-side favorites or discovery action
///
/// Failed actions leave the favorites cache exactly as it was.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Session missing or expired (server answered 401)
    #[error("Not signed in")]
    Unauthenticated,

    /// Another add/remove for the same catalog item has not finished
    #[error("An action for {0} is already in progress")]
    ActionInFlight(String),

    /// Request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server answered with an unexpected status
    #[error("Server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl SyncError {
    /// Whether the caller may reasonably try the same action again
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport(_) | SyncError::ActionInFlight(_) => true,
            SyncError::Status { status, .. } => *status >= 500,
            SyncError::Unauthenticated | SyncError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}

/// Result type for client actions
pub type SyncResult<T> = std::result::Result<T, SyncError>;
