//! Follow-up question suggestions
//!
//! A small, fixed index of curated follow-up questions with precomputed
//! embeddings, loaded once at startup. The searcher embeds the current
//! query and returns the most similar questions above a similarity floor.
//! Suggestions are cosmetic; the caller treats failures and timeouts as an
//! empty list.

use std::path::Path;
use std::sync::Arc;

use advisor_core::SuggestionEntry;

use crate::embeddings::{cosine_similarity, Embedder};
use crate::RagError;

/// Precomputed suggestion index
pub struct SuggestionIndex {
    entries: Vec<SuggestionEntry>,
}

impl SuggestionIndex {
    pub fn new(entries: Vec<SuggestionEntry>) -> Self {
        Self { entries }
    }

    /// Load entries from a JSON file (array of question + embedding)
    pub fn load(path: &Path) -> Result<Self, RagError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RagError::Index(format!("suggestion index read failed: {}", e)))?;
        let entries: Vec<SuggestionEntry> = serde_json::from_str(&raw)
            .map_err(|e| RagError::Index(format!("suggestion index parse failed: {}", e)))?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Searcher over the suggestion index
pub struct SuggestionSearcher {
    index: Arc<SuggestionIndex>,
    embedder: Arc<dyn Embedder>,
    top_n: usize,
    similarity_floor: f32,
}

impl SuggestionSearcher {
    pub fn new(
        index: Arc<SuggestionIndex>,
        embedder: Arc<dyn Embedder>,
        top_n: usize,
        similarity_floor: f32,
    ) -> Self {
        Self {
            index,
            embedder,
            top_n,
            similarity_floor,
        }
    }

    /// Return up to `top_n` follow-up questions similar to the query
    ///
    /// Entries whose embedding dimension does not match the query embedding
    /// are skipped rather than treated as an error.
    pub async fn search(&self, query: &str) -> Result<Vec<String>, RagError> {
        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(f32, &str)> = self
            .index
            .entries
            .iter()
            .filter(|e| e.embedding.len() == query_embedding.len())
            .map(|e| {
                (
                    cosine_similarity(&query_embedding, &e.embedding),
                    e.question.as_str(),
                )
            })
            .filter(|(score, _)| *score >= self.similarity_floor)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(self.top_n);

        Ok(scored.into_iter().map(|(_, q)| q.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;

    async fn entry(embedder: &HashEmbedder, question: &str) -> SuggestionEntry {
        SuggestionEntry {
            question: question.to_string(),
            embedding: embedder.embed(question).await.unwrap(),
        }
    }

    #[tokio::test]
    async fn test_identical_question_ranks_first() {
        let embedder = HashEmbedder::new(64);
        let index = SuggestionIndex::new(vec![
            entry(&embedder, "Học phí UIT là bao nhiêu?").await,
            entry(&embedder, "Điểm chuẩn ngành Khoa học máy tính?").await,
            entry(&embedder, "Ký túc xá có chỗ không?").await,
        ]);

        let searcher = SuggestionSearcher::new(
            Arc::new(index),
            Arc::new(HashEmbedder::new(64)),
            3,
            0.5,
        );

        let suggestions = searcher.search("Học phí UIT là bao nhiêu?").await.unwrap();
        assert_eq!(suggestions[0], "Học phí UIT là bao nhiêu?");
    }

    #[tokio::test]
    async fn test_respects_top_n() {
        let embedder = HashEmbedder::new(64);
        let mut entries = Vec::new();
        for i in 0..10 {
            entries.push(entry(&embedder, &format!("Câu hỏi {}", i)).await);
        }
        let searcher = SuggestionSearcher::new(
            Arc::new(SuggestionIndex::new(entries)),
            Arc::new(HashEmbedder::new(64)),
            3,
            0.0,
        );

        let suggestions = searcher.search("Câu hỏi 1").await.unwrap();
        assert_eq!(suggestions.len(), 3);
    }

    #[tokio::test]
    async fn test_similarity_floor_filters() {
        let embedder = HashEmbedder::new(64);
        let index = SuggestionIndex::new(vec![
            entry(&embedder, "abcdefgh").await,
        ]);
        let searcher = SuggestionSearcher::new(
            Arc::new(index),
            Arc::new(HashEmbedder::new(64)),
            3,
            0.99,
        );

        // dissimilar query falls below the floor
        let suggestions = searcher.search("zzzzzzzzzzzzzzzzzz").await.unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_skipped() {
        let index = SuggestionIndex::new(vec![SuggestionEntry {
            question: "Câu hỏi lỗi".to_string(),
            embedding: vec![1.0; 8],
        }]);
        let searcher = SuggestionSearcher::new(
            Arc::new(index),
            Arc::new(HashEmbedder::new(64)),
            3,
            0.0,
        );
        let suggestions = searcher.search("bất kỳ").await.unwrap();
        assert!(suggestions.is_empty());
    }
}
