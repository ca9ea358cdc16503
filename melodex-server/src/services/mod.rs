//! Outbound gateways to the music catalog and the completion model
//!
//! Handlers depend on the [`CatalogGateway`] and [`CompletionGateway`] traits
//! so that tests can substitute in-process fakes for the HTTP clients.

pub mod openai;
pub mod recommender;
pub mod spotify;

use async_trait::async_trait;
use melodex_common::Track;
use thiserror::Error;

pub use openai::OpenAiCompletion;
pub use spotify::SpotifyCatalog;

/// Failure talking to an external gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Upstream answered with an unexpected body
    #[error("Failed to parse upstream response: {0}")]
    Parse(String),

    /// Credentials or endpoint missing from configuration
    #[error("Gateway not configured: {0}")]
    NotConfigured(String),
}

impl GatewayError {
    /// Classify a reqwest failure, separating timeouts from other transport errors
    pub fn from_reqwest(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout(format!("{}: {}", context, err))
        } else if err.is_decode() {
            GatewayError::Parse(format!("{}: {}", context, err))
        } else {
            GatewayError::Network(format!("{}: {}", context, err))
        }
    }

    /// Whether retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Timeout(_) | GatewayError::Network(_) => true,
            GatewayError::Status { status, .. } => *status == 429 || *status >= 500,
            GatewayError::Parse(_) | GatewayError::NotConfigured(_) => false,
        }
    }
}

/// Keyword search against the external music catalog
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Search the catalog and map results into [`Track`]s
    ///
    /// `result_type` is passed through to the catalog (`track`, `album`, ...);
    /// only track results are mapped.
    async fn search(&self, query: &str, result_type: &str) -> Result<Vec<Track>, GatewayError>;
}

/// Text generation by a hosted language model
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError>;
}
