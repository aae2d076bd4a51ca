//! Anthropic Messages API client used as the answer model.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{classify_http_status, parse_retry_after, with_retry};
use super::{AnswerModel, ProviderError, ProviderErrorKind, RetryConfig};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Answers must be reproducible; temperature stays at zero.
const ANSWER_TEMPERATURE: f64 = 0.0;
const ANSWER_MAX_TOKENS: u32 = 4000;

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    retry_config: RetryConfig,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            retry_config: RetryConfig::default(),
        }
    }

    pub fn with_retry_config(api_key: String, model: String, retry_config: RetryConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            retry_config,
        }
    }

    async fn execute_request(&self, request: &MessagesRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::network_error(format!("Request timeout: {}", e))
                } else if e.is_connect() {
                    ProviderError::network_error(format!("Connection failed: {}", e))
                } else {
                    ProviderError::network_error(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let code = status.as_u16();
            return Err(match classify_http_status(code) {
                ProviderErrorKind::RateLimited => ProviderError::rate_limited(body, retry_after),
                ProviderErrorKind::ClientError => ProviderError::client_error(code, body),
                _ => ProviderError::server_error(code, body),
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        parsed
            .content
            .into_iter()
            .find_map(|block| (block.block_type == "text").then_some(block.text).flatten())
            .ok_or_else(|| ProviderError::parse_error("No text block in response".to_string()))
    }
}

#[async_trait]
impl AnswerModel for AnthropicClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: ANSWER_MAX_TOKENS,
            temperature: ANSWER_TEMPERATURE,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "requesting answers");
        with_retry(&self.retry_config, || self.execute_request(&request)).await
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_block_is_extracted() {
        let body = r#"{"content":[{"type":"text","text":"Aufgabe 1: B"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content[0].block_type, "text");
        assert_eq!(parsed.content[0].text.as_deref(), Some("Aufgabe 1: B"));
    }

    #[test]
    fn request_carries_model_and_temperature() {
        let request = MessagesRequest {
            model: "claude-3-opus-20240229".to_string(),
            max_tokens: 4000,
            temperature: 0.0,
            messages: vec![Message {
                role: "user".to_string(),
                content: "prompt".to_string(),
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-opus-20240229");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
