//! Application state
//!
//! Every collaborator is built once from settings and shared behind `Arc`;
//! request handlers only ever clone pointers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use advisor_agent::{AgentConfig, ToolAgent};
use advisor_chat::GroundedComposer;
use advisor_config::Settings;
use advisor_conversation::{ConversationStore, InMemoryStore};
use advisor_llm::{ChatBackend, LlmBackend, LlmConfig};
use advisor_pipeline::{Orchestrator, PipelineConfig};
use advisor_preprocess::providers::GatewayTask;
use advisor_preprocess::{GatewayClient, LexicalNormalizer, QueryRouter, SafetyDomainGate};
use advisor_rag::{
    Embedder, HttpEmbedder, HybridRetriever, QdrantStore, SparseConfig, SparseIndex,
    SuggestionIndex, SuggestionSearcher, VectorStoreConfig,
};
use advisor_tools::{scoring_registry, KnowledgeSearchTool};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Kept for the readiness endpoint
    pub llm: Arc<dyn LlmBackend>,
}

impl AppState {
    /// Build the full pipeline from settings
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let classifier_timeout = Duration::from_millis(settings.models.classifier_timeout_ms);
        let gateway = |task| {
            Arc::new(GatewayClient::new(
                settings.models.classifier_gateway.clone(),
                task,
                classifier_timeout,
            ))
        };

        let normalizer = Arc::new(LexicalNormalizer::new(
            gateway(GatewayTask::LanguageId),
            gateway(GatewayTask::ToneRestore),
            settings.normalizer.clone(),
        ));
        let gate = Arc::new(SafetyDomainGate::new(
            gateway(GatewayTask::PromptInjection),
            gateway(GatewayTask::DomainRelevance),
            settings.gate.clone(),
        ));
        let router = Arc::new(QueryRouter::new(
            gateway(GatewayTask::RouteClassify),
            settings.gate.clone(),
        ));

        let embedder: Arc<dyn Embedder> = Arc::new(
            HttpEmbedder::new(
                settings.models.embed_endpoint.clone(),
                settings.models.embed_model.clone(),
                settings.models.embed_api_key.clone(),
                settings.rag.vector_dim,
                Duration::from_millis(settings.models.embed_timeout_ms),
            )
            .context("failed to build embedder")?,
        );
        let dense = Arc::new(
            QdrantStore::new(
                VectorStoreConfig {
                    endpoint: settings.rag.qdrant_endpoint.clone(),
                    collection: settings.rag.collection.clone(),
                    vector_dim: settings.rag.vector_dim,
                    api_key: None,
                },
                embedder.clone(),
            )
            .context("failed to connect to the vector store")?,
        );
        let sparse = Arc::new(
            SparseIndex::new(SparseConfig {
                index_path: settings.rag.sparse_index_path.clone(),
            })
            .context("failed to open the sparse index")?,
        );
        let retriever = Arc::new(HybridRetriever::new(dense, sparse, (&settings.rag).into()));

        let llm: Arc<dyn LlmBackend> = Arc::new(
            ChatBackend::new(LlmConfig::from_settings(settings))
                .context("failed to build the LLM backend")?,
        );
        let composer = Arc::new(GroundedComposer::new(llm.clone()));

        let mut registry = scoring_registry().with_timeout_secs(settings.agent.tool_timeout_secs);
        registry.register(KnowledgeSearchTool::new(retriever.clone()));
        let agent = Arc::new(ToolAgent::new(
            llm.clone(),
            Arc::new(registry),
            AgentConfig {
                max_iterations: settings.agent.max_iterations,
            },
        ));

        let store: Arc<dyn ConversationStore> = Arc::new(InMemoryStore::new());
        let suggestions = load_suggestions(settings, embedder);

        let orchestrator = Arc::new(Orchestrator::new(
            normalizer,
            gate,
            router,
            retriever,
            composer,
            agent,
            store,
            suggestions,
            PipelineConfig::from_settings(settings),
        ));

        Ok(Self { orchestrator, llm })
    }
}

/// Load the precomputed suggestion index, if configured
///
/// A missing or unreadable index disables suggestions instead of failing
/// startup; the chat path does not depend on it.
fn load_suggestions(
    settings: &Settings,
    embedder: Arc<dyn Embedder>,
) -> Option<Arc<SuggestionSearcher>> {
    let path = settings.suggestions.index_path.as_deref()?;
    match SuggestionIndex::load(Path::new(path)) {
        Ok(index) => {
            tracing::info!(path, entries = index.len(), "loaded suggestion index");
            Some(Arc::new(SuggestionSearcher::new(
                Arc::new(index),
                embedder,
                settings.suggestions.top_n,
                settings.suggestions.similarity_floor,
            )))
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "suggestion index unavailable, disabling suggestions");
            None
        }
    }
}
