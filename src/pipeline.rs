//! Per-document orchestration: OCR, task scan, dual model calls, consensus.
//!
//! The two answer requests are independent and slow, so they run
//! concurrently; correctness does not depend on their ordering. A failed
//! secondary call degrades to single-source reporting, a failed primary
//! call is absorbed by the reconciler's fallback swap, and only both
//! failing is an error.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{content_key, AnalysisCache};
use crate::exam::{reconcile, scan_valid_tasks, ConsensusReport, TaskId};
use crate::llm::{AnswerModel, VisionModel};
use crate::prompt;

/// Everything derived from one uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    /// SHA-256 of the uploaded image bytes; also the cache key.
    pub content_hash: String,
    /// Verbatim transcript from the vision model.
    pub ocr_text: String,
    /// Task numbers found in the transcript, ascending.
    pub valid_tasks: Vec<TaskId>,
    /// Reconciled answers for the valid tasks.
    pub report: ConsensusReport,
    pub created_at: DateTime<Utc>,
}

/// Orchestrates the analysis of uploaded exam photos.
pub struct Analyzer {
    ocr: Arc<dyn VisionModel>,
    answerer: Arc<dyn AnswerModel>,
    cache: AnalysisCache,
    knowledge: Option<String>,
}

impl Analyzer {
    pub fn new(
        ocr: Arc<dyn VisionModel>,
        answerer: Arc<dyn AnswerModel>,
        knowledge: Option<String>,
    ) -> Self {
        Self {
            ocr,
            answerer,
            cache: AnalysisCache::new(),
            knowledge,
        }
    }

    /// Analyze one uploaded image; returns the analysis and whether it was
    /// served from the cache.
    pub async fn analyze(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> anyhow::Result<(DocumentAnalysis, bool)> {
        let key = content_key(image);
        if let Some(hit) = self.cache.get(&key).await {
            info!(content_hash = %key, "serving analysis from cache");
            return Ok((hit, true));
        }

        let ocr_text = self
            .ocr
            .transcribe(image, mime_type, prompt::OCR_INSTRUCTION)
            .await
            .context("vision transcription failed")?;

        let valid_tasks = scan_valid_tasks(&ocr_text);
        let report = if valid_tasks.is_empty() {
            // No recognizable tasks: skip the model calls and return an
            // empty report; surfacing this is the caller's job.
            warn!(content_hash = %key, "transcript contains no recognizable task labels");
            reconcile(&valid_tasks, "", None)
        } else {
            let primary_prompt = prompt::build_answer_prompt(&ocr_text, self.knowledge.as_deref());
            let recheck_prompt = prompt::build_recheck_prompt(&ocr_text);

            let (primary, secondary) = tokio::join!(
                self.answerer.complete(&primary_prompt),
                self.answerer.complete(&recheck_prompt),
            );

            match (primary, secondary) {
                (Ok(a), Ok(b)) => reconcile(
                    &valid_tasks,
                    &prompt::clean_response_lines(&a),
                    Some(&prompt::clean_response_lines(&b)),
                ),
                (Ok(a), Err(e)) => {
                    warn!("secondary answer request failed: {e:#}");
                    reconcile(&valid_tasks, &prompt::clean_response_lines(&a), None)
                }
                (Err(e), Ok(b)) => {
                    // An empty primary triggers the reconciler's fallback
                    // swap, promoting the surviving response.
                    warn!("primary answer request failed: {e:#}");
                    reconcile(&valid_tasks, "", Some(&prompt::clean_response_lines(&b)))
                }
                (Err(primary_err), Err(secondary_err)) => {
                    return Err(primary_err.context(format!(
                        "both answer requests failed (secondary: {secondary_err:#})"
                    )));
                }
            }
        };

        let analysis = DocumentAnalysis {
            content_hash: key.clone(),
            ocr_text,
            valid_tasks: valid_tasks.into_iter().collect(),
            report,
            created_at: Utc::now(),
        };

        self.cache.insert(key, analysis.clone()).await;
        Ok((analysis, false))
    }

    /// Drop the cached analysis for one content hash.
    pub async fn invalidate(&self, content_hash: &str) -> bool {
        self.cache.invalidate(content_hash).await
    }

    /// Drop all cached analyses.
    pub async fn clear_cache(&self) -> usize {
        self.cache.clear().await
    }
}
