//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::pipeline::DocumentAnalysis;

/// Response for a document analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    /// Whether the analysis was served from the content-hash cache
    pub cached: bool,

    #[serde(flatten)]
    pub analysis: DocumentAnalysis,
}

/// Request to drop one cached analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// The content hash returned by a previous analysis
    pub content_hash: String,
}

/// Response after a cache invalidation.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Whether an entry existed for the hash
    pub removed: bool,
}

/// Response after clearing the cache.
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    /// Number of entries removed
    pub removed: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
