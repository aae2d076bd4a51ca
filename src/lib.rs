//! # Koifox
//!
//! Exam-photo solver: transcribes an uploaded exam page with a hosted
//! vision model, asks a hosted answer model for solutions twice, and
//! cross-validates the two responses into a structured per-task report.
//!
//! ## Flow
//! 1. Receive an exam photo via the HTTP API
//! 2. Transcribe it (vision OCR) and scan the transcript for task labels
//! 3. Issue two concurrent answer requests with different prompts
//! 4. Parse both responses, drop hallucinated tasks, reconcile
//! 5. Cache the analysis under the image's content hash
//!
//! ## Modules
//! - `exam`: answer normalization, parsing, validation, consensus (the core)
//! - `llm`: Gemini / Anthropic provider clients behind narrow traits
//! - `pipeline`: per-document orchestration
//! - `api`: HTTP surface

pub mod api;
pub mod cache;
pub mod config;
pub mod exam;
pub mod knowledge;
pub mod llm;
pub mod pipeline;
pub mod prompt;

pub use config::Config;
