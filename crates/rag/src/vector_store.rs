//! Dense search via Qdrant
//!
//! Read-only at request time: the core only searches; indexing belongs to
//! the external ingestion workflow.

use std::collections::HashMap;
use std::sync::Arc;

use advisor_core::{ChunkMetadata, DocumentChunk, ScoredChunk};
use async_trait::async_trait;
use qdrant_client::qdrant::{value::Kind, SearchPointsBuilder};
use qdrant_client::Qdrant;

use crate::embeddings::Embedder;
use crate::retriever::DenseSearch;
use crate::RagError;

/// Vector store configuration
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    /// Qdrant endpoint
    pub endpoint: String,
    /// Collection name
    pub collection: String,
    /// Vector dimension
    pub vector_dim: usize,
    /// API key (optional)
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: advisor_config::constants::endpoints::QDRANT_DEFAULT.to_string(),
            collection: "uit_admissions".to_string(),
            vector_dim: 1536,
            api_key: None,
        }
    }
}

/// Qdrant-backed dense search over the knowledge base
pub struct QdrantStore {
    client: Qdrant,
    config: VectorStoreConfig,
    embedder: Arc<dyn Embedder>,
}

impl QdrantStore {
    pub fn new(config: VectorStoreConfig, embedder: Arc<dyn Embedder>) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint);
        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            config,
            embedder,
        })
    }

    fn payload_str(
        payload: &HashMap<String, qdrant_client::qdrant::Value>,
        key: &str,
    ) -> Option<String> {
        payload.get(key).and_then(|v| match &v.kind {
            Some(Kind::StringValue(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
    }

    fn chunk_from_payload(
        id: String,
        payload: &HashMap<String, qdrant_client::qdrant::Value>,
    ) -> DocumentChunk {
        DocumentChunk {
            id,
            content: Self::payload_str(payload, "content").unwrap_or_default(),
            metadata: ChunkMetadata {
                title: Self::payload_str(payload, "title"),
                section: Self::payload_str(payload, "section"),
                page: Self::payload_str(payload, "page"),
                data_type: Self::payload_str(payload, "data_type"),
                link: Self::payload_str(payload, "link"),
            },
        }
    }
}

#[async_trait]
impl DenseSearch for QdrantStore {
    async fn dense_search(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        let embedding = self.embedder.embed(text).await?;

        if embedding.len() != self.config.vector_dim {
            return Err(RagError::Embedding(format!(
                "embedding dimension {} does not match collection dimension {}",
                embedding.len(),
                self.config.vector_dim
            )));
        }

        let search = SearchPointsBuilder::new(&self.config.collection, embedding, k as u64)
            .with_payload(true);

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .and_then(|id| id.point_id_options)
                    .map(|opts| match opts {
                        qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u) => u,
                        qdrant_client::qdrant::point_id::PointIdOptions::Num(n) => n.to_string(),
                    })
                    .unwrap_or_default();

                ScoredChunk {
                    chunk: Self::chunk_from_payload(id, &point.payload),
                    score: point.score,
                }
            })
            .collect();

        Ok(results)
    }
}
