//! Hybrid retriever
//!
//! Issues dense and sparse searches concurrently and merges the candidate
//! sets by chunk id. Chunks found by both backends get a weighted sum of
//! their normalized scores; chunks found by only one keep their normalized
//! native score scaled by a penalty factor, so agreement between both
//! retrieval modes is rewarded. One backend failing degrades the request to
//! single-source ranking instead of failing retrieval outright.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use advisor_core::{RetrievalResult, ScoredChunk};
use async_trait::async_trait;

use crate::RagError;

/// Dense (semantic) search collaborator
#[async_trait]
pub trait DenseSearch: Send + Sync {
    async fn dense_search(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>, RagError>;
}

/// Sparse (keyword) search collaborator
///
/// Synchronous by contract; the retriever moves calls off the async
/// executor with `spawn_blocking`.
pub trait SparseSearch: Send + Sync {
    fn sparse_search(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>, RagError>;
}

/// Retriever configuration
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Candidates fetched from each backend
    pub candidate_k: usize,
    /// Final number of results after merging
    pub top_k: usize,
    /// Weight for dense scores in the weighted sum (0.0 - 1.0)
    pub dense_weight: f32,
    /// Penalty applied to chunks found by only one backend
    pub single_source_penalty: f32,
    /// Per-backend search timeout
    pub search_timeout: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        use advisor_config::constants::rag;
        Self {
            candidate_k: rag::DEFAULT_CANDIDATE_K,
            top_k: rag::DEFAULT_TOP_K,
            dense_weight: rag::DENSE_WEIGHT,
            single_source_penalty: rag::SINGLE_SOURCE_PENALTY,
            search_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&advisor_config::RagConfig> for RetrieverConfig {
    fn from(config: &advisor_config::RagConfig) -> Self {
        Self {
            candidate_k: config.candidate_k,
            top_k: config.top_k,
            dense_weight: config.dense_weight,
            single_source_penalty: config.single_source_penalty,
            search_timeout: Duration::from_millis(config.search_timeout_ms),
        }
    }
}

/// Hybrid retriever combining dense and sparse search
pub struct HybridRetriever {
    dense: Arc<dyn DenseSearch>,
    sparse: Arc<dyn SparseSearch>,
    config: RetrieverConfig,
}

impl HybridRetriever {
    pub fn new(
        dense: Arc<dyn DenseSearch>,
        sparse: Arc<dyn SparseSearch>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            dense,
            sparse,
            config,
        }
    }

    /// Retrieve a ranked, deduplicated result for one query
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult, RagError> {
        let k = self.config.candidate_k;

        let dense_future = tokio::time::timeout(
            self.config.search_timeout,
            self.dense.dense_search(query, k),
        );

        let sparse = Arc::clone(&self.sparse);
        let query_owned = query.to_string();
        let sparse_future = tokio::time::timeout(self.config.search_timeout, async move {
            tokio::task::spawn_blocking(move || sparse.sparse_search(&query_owned, k))
                .await
                .map_err(|e| RagError::Search(format!("sparse search task failed: {}", e)))?
        });

        let (dense_result, sparse_result) = tokio::join!(dense_future, sparse_future);

        let dense_result = dense_result
            .map_err(|_| RagError::Search("dense search timed out".to_string()))
            .and_then(|r| r);
        let sparse_result = sparse_result
            .map_err(|_| RagError::Search("sparse search timed out".to_string()))
            .and_then(|r| r);

        let (entries, degraded) = match (dense_result, sparse_result) {
            (Ok(dense), Ok(sparse)) => (self.merge(dense, sparse), false),
            (Ok(dense), Err(e)) => {
                tracing::warn!(error = %e, "sparse backend unavailable, dense-only ranking");
                (normalize(dense), true)
            }
            (Err(e), Ok(sparse)) => {
                tracing::warn!(error = %e, "dense backend unavailable, sparse-only ranking");
                (normalize(sparse), true)
            }
            (Err(dense_err), Err(sparse_err)) => {
                return Err(RagError::AllBackendsFailed {
                    dense: dense_err.to_string(),
                    sparse: sparse_err.to_string(),
                });
            }
        };

        let mut result = RetrievalResult::from_entries(query, entries).with_degraded(degraded);
        result.truncate(self.config.top_k);
        Ok(result)
    }

    /// Union by chunk id with weighted-sum scoring
    fn merge(&self, dense: Vec<ScoredChunk>, sparse: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
        let dense = normalize(dense);
        let sparse = normalize(sparse);

        struct Candidate {
            entry: ScoredChunk,
            dense_score: Option<f32>,
            sparse_score: Option<f32>,
        }

        let mut candidates: HashMap<String, Candidate> = HashMap::new();

        for entry in dense {
            let score = entry.score;
            candidates
                .entry(entry.chunk.id.clone())
                .or_insert(Candidate {
                    entry,
                    dense_score: None,
                    sparse_score: None,
                })
                .dense_score = Some(score);
        }

        for entry in sparse {
            let score = entry.score;
            candidates
                .entry(entry.chunk.id.clone())
                .or_insert(Candidate {
                    entry,
                    dense_score: None,
                    sparse_score: None,
                })
                .sparse_score = Some(score);
        }

        let w = self.config.dense_weight;
        let penalty = self.config.single_source_penalty;

        candidates
            .into_values()
            .map(|c| {
                let score = match (c.dense_score, c.sparse_score) {
                    (Some(d), Some(s)) => w * d + (1.0 - w) * s,
                    (Some(d), None) => d * penalty,
                    (None, Some(s)) => s * penalty,
                    (None, None) => 0.0,
                };
                ScoredChunk {
                    chunk: c.entry.chunk,
                    score,
                }
            })
            .collect()
    }
}

/// Min-max normalize scores to [0, 1]
///
/// Cosine similarity and BM25 are on incomparable scales; normalizing per
/// candidate list makes the weighted sum meaningful.
fn normalize(mut entries: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    if entries.is_empty() {
        return entries;
    }
    let max = entries.iter().map(|e| e.score).fold(f32::MIN, f32::max);
    let min = entries.iter().map(|e| e.score).fold(f32::MAX, f32::min);
    let range = max - min;

    for entry in &mut entries {
        entry.score = if range > f32::EPSILON {
            (entry.score - min) / range
        } else {
            1.0
        };
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{ChunkMetadata, DocumentChunk};

    fn scored(id: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: DocumentChunk {
                id: id.to_string(),
                content: format!("content {}", id),
                metadata: ChunkMetadata::default(),
            },
            score,
        }
    }

    struct FixedDense(Result<Vec<ScoredChunk>, String>);

    #[async_trait]
    impl DenseSearch for FixedDense {
        async fn dense_search(&self, _: &str, _: usize) -> Result<Vec<ScoredChunk>, RagError> {
            self.0.clone().map_err(RagError::Search)
        }
    }

    struct FixedSparse(Result<Vec<ScoredChunk>, String>);

    impl SparseSearch for FixedSparse {
        fn sparse_search(&self, _: &str, _: usize) -> Result<Vec<ScoredChunk>, RagError> {
            self.0.clone().map_err(RagError::Search)
        }
    }

    fn retriever(
        dense: Result<Vec<ScoredChunk>, String>,
        sparse: Result<Vec<ScoredChunk>, String>,
    ) -> HybridRetriever {
        HybridRetriever::new(
            Arc::new(FixedDense(dense)),
            Arc::new(FixedSparse(sparse)),
            RetrieverConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_agreement_rewarded() {
        // "b" appears in both lists with middling scores; "a" and "c" top
        // one list each. The penalty factor should rank "b" first.
        let dense = vec![scored("a", 0.9), scored("b", 0.8), scored("x", 0.1)];
        let sparse = vec![scored("c", 12.0), scored("b", 10.0), scored("y", 1.0)];

        let result = retriever(Ok(dense), Ok(sparse))
            .retrieve("query")
            .await
            .unwrap();

        assert_eq!(result.chunk_ids()[0], "b");
        assert!(!result.degraded);
    }

    #[tokio::test]
    async fn test_sorted_and_deduplicated() {
        let dense = vec![scored("a", 0.9), scored("b", 0.5)];
        let sparse = vec![scored("a", 8.0), scored("c", 3.0)];

        let result = retriever(Ok(dense), Ok(sparse))
            .retrieve("query")
            .await
            .unwrap();

        let ids = result.chunk_ids();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());

        let scores: Vec<f32> = result.entries().iter().map(|e| e.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_truncated_to_top_k() {
        let dense: Vec<ScoredChunk> = (0..30).map(|i| scored(&format!("d{}", i), 1.0 / (i + 1) as f32)).collect();
        let result = retriever(Ok(dense), Ok(vec![]))
            .retrieve("query")
            .await
            .unwrap();
        assert!(result.len() <= RetrieverConfig::default().top_k);
    }

    #[tokio::test]
    async fn test_sparse_failure_degrades_to_dense() {
        let dense = vec![scored("a", 0.9), scored("b", 0.5)];
        let result = retriever(Ok(dense), Err("index down".into()))
            .retrieve("query")
            .await
            .unwrap();

        assert!(result.degraded);
        assert_eq!(result.chunk_ids(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_dense_failure_degrades_to_sparse() {
        let sparse = vec![scored("c", 4.0)];
        let result = retriever(Err("qdrant down".into()), Ok(sparse))
            .retrieve("query")
            .await
            .unwrap();

        assert!(result.degraded);
        assert_eq!(result.chunk_ids(), vec!["c"]);
    }

    #[tokio::test]
    async fn test_both_failures_fatal() {
        let err = retriever(Err("down".into()), Err("down".into()))
            .retrieve("query")
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::AllBackendsFailed { .. }));
    }
}
