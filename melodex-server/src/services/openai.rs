//! OpenAI chat-completions client
//!
//! Sends a single user message and returns the first choice's content.

use async_trait::async_trait;
use melodex_common::config::CompletionConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{CompletionGateway, GatewayError};

/// OpenAI completion client
pub struct OpenAiCompletion {
    http_client: Client,
    api_key: Option<String>,
    model: String,
    api_url: String,
}

impl OpenAiCompletion {
    pub fn from_config(config: &CompletionConfig) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CompletionGateway for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        let Some(api_key) = &self.api_key else {
            return Err(GatewayError::NotConfigured(
                "OpenAI API key is not set".to_string(),
            ));
        };

        debug!(model = %self.model, prompt_length = prompt.len(), "Requesting completion");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest("Completion request failed", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(format!("Failed to parse completion: {}", e)))?;

        first_choice_text(chat)
    }
}

fn first_choice_text(chat: ChatResponse) -> Result<String, GatewayError> {
    chat.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GatewayError::Parse("Completion response has no content".to_string()))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_choice_text() {
        let chat: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"chill lofi beats"}}]}"#,
        )
        .unwrap();

        assert_eq!(first_choice_text(chat).unwrap(), "chill lofi beats");
    }

    #[test]
    fn test_empty_choices_is_parse_error() {
        let chat: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();

        assert!(matches!(first_choice_text(chat), Err(GatewayError::Parse(_))));
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_not_configured() {
        let client = OpenAiCompletion::from_config(&CompletionConfig::default()).unwrap();

        let result = client.complete("hello").await;
        assert!(matches!(result, Err(GatewayError::NotConfigured(_))));
    }
}
