//! Knowledge-base chunk, retrieval and citation types

use serde::{Deserialize, Serialize};

/// Source metadata attached to an indexed chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Document title
    #[serde(default)]
    pub title: Option<String>,
    /// Section or chapter label
    #[serde(default)]
    pub section: Option<String>,
    /// Page reference
    #[serde(default)]
    pub page: Option<String>,
    /// Source data type (pdf, web page, table, ...)
    #[serde(default)]
    pub data_type: Option<String>,
    /// Source link
    #[serde(default)]
    pub link: Option<String>,
}

/// An indexed, citable unit of knowledge-base text
///
/// Chunks are created during ingestion and are read-only to this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Stable identifier
    pub id: String,
    /// Text body
    pub content: String,
    /// Source metadata
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

/// A chunk paired with its relevance score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Ordered retrieval output for one request
///
/// Entries are sorted by descending score and contain no duplicate chunk
/// identifiers. Construction goes through [`RetrievalResult::from_entries`],
/// which enforces both invariants.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    /// Query text that produced this result
    pub query: String,
    entries: Vec<ScoredChunk>,
    /// One retrieval backend was unavailable and the ranking is single-source
    pub degraded: bool,
}

impl RetrievalResult {
    /// Build a result, deduplicating by chunk id (first occurrence wins)
    /// and sorting by descending score.
    pub fn from_entries(query: impl Into<String>, mut entries: Vec<ScoredChunk>) -> Self {
        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        let mut seen = std::collections::HashSet::new();
        entries.retain(|e| seen.insert(e.chunk.id.clone()));
        Self {
            query: query.into(),
            entries,
            degraded: false,
        }
    }

    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            entries: Vec::new(),
            degraded: false,
        }
    }

    pub fn with_degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }

    pub fn entries(&self) -> &[ScoredChunk] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Keep only the top `k` entries
    pub fn truncate(&mut self, k: usize) {
        self.entries.truncate(k);
    }

    pub fn chunk_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.chunk.id.as_str()).collect()
    }

    pub fn contains_chunk(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.chunk.id == id)
    }
}

/// A formatted source reference attached to a final answer
///
/// Citations are built mechanically from chunk metadata, never generated by
/// the model, so every citation resolves to a chunk actually present in the
/// retrieval result that produced the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Identifier of the cited chunk
    pub chunk_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Citation {
    pub fn from_chunk(chunk: &DocumentChunk) -> Self {
        Self {
            chunk_id: chunk.id.clone(),
            title: chunk.metadata.title.clone(),
            section: chunk.metadata.section.clone(),
            page: chunk.metadata.page.clone(),
            data_type: chunk.metadata.data_type.clone(),
            link: chunk.metadata.link.clone(),
        }
    }
}

/// A precomputed follow-up question with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionEntry {
    /// Canned follow-up question text
    pub question: String,
    /// Precomputed embedding of the question
    pub embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str) -> DocumentChunk {
        DocumentChunk {
            id: id.to_string(),
            content: format!("content {}", id),
            metadata: ChunkMetadata::default(),
        }
    }

    #[test]
    fn test_retrieval_result_sorted_and_deduped() {
        let entries = vec![
            ScoredChunk { chunk: chunk("a"), score: 0.2 },
            ScoredChunk { chunk: chunk("b"), score: 0.9 },
            ScoredChunk { chunk: chunk("a"), score: 0.8 },
            ScoredChunk { chunk: chunk("c"), score: 0.5 },
        ];
        let result = RetrievalResult::from_entries("q", entries);

        assert_eq!(result.len(), 3);
        assert_eq!(result.chunk_ids(), vec!["b", "a", "c"]);
        let scores: Vec<f32> = result.entries().iter().map(|e| e.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_citation_from_chunk() {
        let mut c = chunk("x");
        c.metadata.title = Some("Cẩm nang sau đại học".to_string());
        c.metadata.link = Some("https://example.org/doc".to_string());
        let citation = Citation::from_chunk(&c);
        assert_eq!(citation.chunk_id, "x");
        assert_eq!(citation.title.as_deref(), Some("Cẩm nang sau đại học"));
        assert!(citation.section.is_none());
    }
}
