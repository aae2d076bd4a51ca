//! Content-hash keyed cache of document analyses.
//!
//! Re-uploading the same photo must not trigger another OCR pass or model
//! round trip. The key is a pure function of the image bytes; invalidation
//! is an explicit call, never implicit session state.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::pipeline::DocumentAnalysis;

/// Cache key for an uploaded image: the SHA-256 of its bytes, hex-encoded.
pub fn content_key(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// In-memory analysis cache, keyed by [`content_key`].
#[derive(Default)]
pub struct AnalysisCache {
    entries: RwLock<HashMap<String, DocumentAnalysis>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<DocumentAnalysis> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: String, analysis: DocumentAnalysis) {
        self.entries.write().await.insert(key, analysis);
    }

    /// Drop one entry; returns whether it existed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drop all entries; returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn analysis(hash: &str) -> DocumentAnalysis {
        DocumentAnalysis {
            content_hash: hash.to_string(),
            ocr_text: "TASK 1: x".to_string(),
            valid_tasks: vec![1],
            report: crate::exam::ConsensusReport {
                tasks: BTreeMap::new(),
                rejected_primary: vec![],
                rejected_secondary: vec![],
                primary_swapped: false,
                full_consensus: false,
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn content_key_is_stable_and_distinct() {
        assert_eq!(content_key(b"abc"), content_key(b"abc"));
        assert_ne!(content_key(b"abc"), content_key(b"abd"));
        assert_eq!(content_key(b"abc").len(), 64);
    }

    #[tokio::test]
    async fn insert_get_invalidate_round_trip() {
        let cache = AnalysisCache::new();
        let key = content_key(b"image bytes");

        assert!(cache.get(&key).await.is_none());
        cache.insert(key.clone(), analysis(&key)).await;
        assert_eq!(cache.get(&key).await.unwrap().content_hash, key);

        assert!(cache.invalidate(&key).await);
        assert!(!cache.invalidate(&key).await);
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn clear_reports_removed_count() {
        let cache = AnalysisCache::new();
        cache.insert("a".to_string(), analysis("a")).await;
        cache.insert("b".to_string(), analysis("b")).await;

        assert_eq!(cache.clear().await, 2);
        assert_eq!(cache.clear().await, 0);
    }
}
