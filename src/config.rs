//! Configuration management for Koifox.
//!
//! Configuration is read from environment variables:
//! - `GEMINI_API_KEY` - Required. Key for the vision (OCR) model.
//! - `ANTHROPIC_API_KEY` - Required. Key for the answer model.
//! - `OCR_MODEL` - Optional. Vision model name. Defaults to `gemini-1.5-flash`.
//! - `ANSWER_MODEL` - Optional. Answer model name. Defaults to `claude-3-opus-20240229`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8080`.
//! - `KNOWLEDGE_PATH` - Optional. Local knowledge corpus (a `.zip` or a directory).
//! - `MAX_UPLOAD_BYTES` - Optional. Upload size cap. Defaults to 200 MB.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the vision model
    pub gemini_api_key: String,

    /// API key for the answer model
    pub anthropic_api_key: String,

    /// Vision model used for transcription
    pub ocr_model: String,

    /// Text model used for answering
    pub answer_model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Local knowledge corpus path (zip file or directory)
    pub knowledge_path: Option<PathBuf>,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if either API key is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("ANTHROPIC_API_KEY".to_string()))?;

        let ocr_model =
            std::env::var("OCR_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());

        let answer_model =
            std::env::var("ANSWER_MODEL").unwrap_or_else(|_| "claude-3-opus-20240229".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let knowledge_path = std::env::var("KNOWLEDGE_PATH").ok().map(PathBuf::from);

        let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (200 * 1024 * 1024).to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            gemini_api_key,
            anthropic_api_key,
            ocr_model,
            answer_model,
            host,
            port,
            knowledge_path,
            max_upload_bytes,
        })
    }

    /// Create a config with custom keys (useful for testing).
    pub fn new(gemini_api_key: String, anthropic_api_key: String) -> Self {
        Self {
            gemini_api_key,
            anthropic_api_key,
            ocr_model: "gemini-1.5-flash".to_string(),
            answer_model: "claude-3-opus-20240229".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            knowledge_path: None,
            max_upload_bytes: 200 * 1024 * 1024,
        }
    }
}
