//! Gemini `generateContent` client used for vision OCR.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{classify_http_status, parse_retry_after, with_retry};
use super::{ProviderError, ProviderErrorKind, RetryConfig, VisionModel};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Transcription runs deterministic and bounded; these match the original
/// extraction settings.
const OCR_TEMPERATURE: f64 = 0.0;
const OCR_MAX_OUTPUT_TOKENS: u32 = 4000;

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    retry_config: RetryConfig,
}

impl GeminiClient {
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

    async fn execute_request(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
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

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::parse_error(
                "No candidates in response".to_string(),
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn transcribe(
        &self,
        image: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> anyhow::Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: instruction.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(image),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: OCR_TEMPERATURE,
                max_output_tokens: OCR_MAX_OUTPUT_TOKENS,
            },
        };

        tracing::debug!(model = %self.model, bytes = image.len(), "transcribing image");
        with_retry(&self.retry_config, || self.execute_request(&request)).await
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inline_data")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
