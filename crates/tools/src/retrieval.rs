//! Knowledge-base search as an agent tool
//!
//! Wraps the hybrid retriever so the agent can fall back to document lookup
//! when deterministic scoring alone cannot answer the question.

use std::sync::Arc;

use advisor_rag::HybridRetriever;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{Tool, ToolError, ToolOutput};

/// Hybrid-retrieval tool
pub struct KnowledgeSearchTool {
    retriever: Arc<HybridRetriever>,
}

impl KnowledgeSearchTool {
    pub fn new(retriever: Arc<HybridRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Tìm kiếm thông tin tuyển sinh và đào tạo UIT trong cơ sở tri thức"
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let query = input
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::invalid_params("query is required"))?;

        let result = self
            .retriever
            .retrieve(query)
            .await
            .map_err(|e| ToolError::execution(e.to_string()))?;

        let chunks: Vec<Value> = result
            .entries()
            .iter()
            .map(|entry| {
                json!({
                    "id": entry.chunk.id,
                    "content": entry.chunk.content,
                    "title": entry.chunk.metadata.title,
                    "link": entry.chunk.metadata.link,
                    "score": entry.score,
                })
            })
            .collect();

        Ok(ToolOutput::json(json!({
            "degraded": result.degraded,
            "chunks": chunks,
        })))
    }
}
