//! External model provider clients.
//!
//! Two narrow trait seams: a vision model that transcribes the uploaded
//! exam photo, and an answer model that solves the transcribed tasks.
//! Both are consumed by the pipeline through trait objects, so the core
//! never knows which hosted service is behind them.

mod anthropic;
mod error;
mod gemini;

pub use anthropic::AnthropicClient;
pub use error::{classify_http_status, ProviderError, ProviderErrorKind, RetryConfig};
pub use gemini::GeminiClient;

use async_trait::async_trait;

/// Vision-capable model used to transcribe an exam photo into plain text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Transcribe the image, following `instruction` for the output format.
    async fn transcribe(
        &self,
        image: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> anyhow::Result<String>;
}

/// Text model used to produce exam answers from a prompt.
#[async_trait]
pub trait AnswerModel: Send + Sync {
    /// Run a single-turn completion and return the response text.
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}
