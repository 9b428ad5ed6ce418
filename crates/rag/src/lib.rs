//! Hybrid retrieval over the admissions knowledge base
//!
//! Features:
//! - Dense vector search via Qdrant
//! - Sparse keyword search via Tantivy
//! - Weighted-sum merge rewarding agreement between both modes
//! - Suggestion search over a precomputed follow-up question index
//!
//! The knowledge base itself is read-only at request time; ingestion is an
//! external collaborator.

pub mod embeddings;
pub mod retriever;
pub mod sparse_search;
pub mod suggestions;
pub mod vector_store;

pub use embeddings::{Embedder, HashEmbedder, HttpEmbedder};
pub use retriever::{DenseSearch, HybridRetriever, RetrieverConfig, SparseSearch};
pub use sparse_search::{SparseConfig, SparseIndex};
pub use suggestions::{SuggestionIndex, SuggestionSearcher};
pub use vector_store::{QdrantStore, VectorStoreConfig};

use thiserror::Error;

/// Retrieval errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    VectorStore(String),

    #[error("search error: {0}")]
    Search(String),

    #[error("index error: {0}")]
    Index(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("both retrieval backends unavailable: dense: {dense}; sparse: {sparse}")]
    AllBackendsFailed { dense: String, sparse: String },
}
