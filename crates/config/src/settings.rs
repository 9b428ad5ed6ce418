//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{agent, conversation, endpoints, gate, rag, suggestions};
use crate::ConfigError;

/// Main application settings
///
/// Built once at startup and passed down immutably. Every tunable the
/// pipeline reads at request time lives here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub models: ModelEndpoints,

    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub suggestions: SuggestionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Endpoints and timeouts for external model providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEndpoints {
    /// Gateway serving language id, tone restoration and the classifiers
    #[serde(default = "default_gateway")]
    pub classifier_gateway: String,
    /// Chat-completions endpoint for generation
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    /// Generation model name
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Embeddings endpoint (OpenAI-compatible)
    #[serde(default = "default_embed_endpoint")]
    pub embed_endpoint: String,
    /// Embedding model name
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    /// API key for the embeddings endpoint, if required
    #[serde(default)]
    pub embed_api_key: Option<String>,
    /// Per-call timeout for embedding requests (ms)
    #[serde(default = "default_embed_timeout_ms")]
    pub embed_timeout_ms: u64,
    /// Per-call timeout for classifier requests (ms)
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,
    /// Per-call timeout for generation requests (ms)
    #[serde(default = "default_llm_timeout_ms")]
    pub llm_timeout_ms: u64,
    /// API key for the LLM endpoint, if required
    #[serde(default)]
    pub llm_api_key: Option<String>,
}

fn default_gateway() -> String {
    endpoints::MODEL_GATEWAY_DEFAULT.to_string()
}

fn default_llm_endpoint() -> String {
    endpoints::LLM_DEFAULT.to_string()
}

fn default_llm_model() -> String {
    "qwen3:4b-instruct-2507-q4_K_M".to_string()
}

fn default_embed_endpoint() -> String {
    endpoints::EMBED_DEFAULT.to_string()
}

fn default_embed_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embed_timeout_ms() -> u64 {
    10_000
}

fn default_classifier_timeout_ms() -> u64 {
    3_000
}

fn default_llm_timeout_ms() -> u64 {
    30_000
}

impl Default for ModelEndpoints {
    fn default() -> Self {
        Self {
            classifier_gateway: default_gateway(),
            llm_endpoint: default_llm_endpoint(),
            llm_model: default_llm_model(),
            embed_endpoint: default_embed_endpoint(),
            embed_model: default_embed_model(),
            embed_api_key: None,
            embed_timeout_ms: default_embed_timeout_ms(),
            classifier_timeout_ms: default_classifier_timeout_ms(),
            llm_timeout_ms: default_llm_timeout_ms(),
            llm_api_key: None,
        }
    }
}

/// Lexical normalizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Language code the tone restorer applies to
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Tone-mark density below which restoration is attempted
    #[serde(default = "default_tone_density_threshold")]
    pub tone_density_threshold: f32,
    /// Language-identification confidence floor
    #[serde(default = "default_min_language_confidence")]
    pub min_language_confidence: f32,
}

fn default_target_language() -> String {
    "vi".to_string()
}

fn default_tone_density_threshold() -> f32 {
    gate::TONE_DENSITY_THRESHOLD
}

fn default_min_language_confidence() -> f32 {
    gate::MIN_LANGUAGE_CONFIDENCE
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            tone_density_threshold: default_tone_density_threshold(),
            min_language_confidence: default_min_language_confidence(),
        }
    }
}

/// Safety and domain gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Below this confidence a classifier verdict is treated as unusable
    #[serde(default = "default_min_classifier_confidence")]
    pub min_classifier_confidence: f32,
    /// Below this route-classifier confidence the retrieval route is used
    #[serde(default = "default_min_route_confidence")]
    pub min_route_confidence: f32,
}

fn default_min_classifier_confidence() -> f32 {
    gate::MIN_CLASSIFIER_CONFIDENCE
}

fn default_min_route_confidence() -> f32 {
    gate::MIN_CLASSIFIER_CONFIDENCE
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_classifier_confidence: default_min_classifier_confidence(),
            min_route_confidence: default_min_route_confidence(),
        }
    }
}

/// Hybrid retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Qdrant endpoint
    #[serde(default = "default_qdrant_endpoint")]
    pub qdrant_endpoint: String,
    /// Qdrant collection holding the knowledge base
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Embedding dimension
    #[serde(default = "default_vector_dim")]
    pub vector_dim: usize,
    /// Sparse index path (in-memory when absent)
    #[serde(default)]
    pub sparse_index_path: Option<String>,
    /// Candidates fetched from each backend
    #[serde(default = "default_candidate_k")]
    pub candidate_k: usize,
    /// Final number of chunks after merging
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Weight of the dense score in the weighted sum (0.0 - 1.0)
    #[serde(default = "default_dense_weight")]
    pub dense_weight: f32,
    /// Penalty factor for chunks found by only one backend (0.0 - 1.0)
    #[serde(default = "default_single_source_penalty")]
    pub single_source_penalty: f32,
    /// Per-backend search timeout (ms)
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
}

fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}

fn default_collection() -> String {
    "uit_admissions".to_string()
}

fn default_vector_dim() -> usize {
    1536
}

fn default_candidate_k() -> usize {
    rag::DEFAULT_CANDIDATE_K
}

fn default_top_k() -> usize {
    rag::DEFAULT_TOP_K
}

fn default_dense_weight() -> f32 {
    rag::DENSE_WEIGHT
}

fn default_single_source_penalty() -> f32 {
    rag::SINGLE_SOURCE_PENALTY
}

fn default_search_timeout_ms() -> u64 {
    5_000
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            qdrant_endpoint: default_qdrant_endpoint(),
            collection: default_collection(),
            vector_dim: default_vector_dim(),
            sparse_index_path: None,
            candidate_k: default_candidate_k(),
            top_k: default_top_k(),
            dense_weight: default_dense_weight(),
            single_source_penalty: default_single_source_penalty(),
            search_timeout_ms: default_search_timeout_ms(),
        }
    }
}

/// Grounded chat composer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum tokens to generate
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: usize,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Retries after the first generation failure
    #[serde(default = "default_generation_retries")]
    pub generation_retries: u32,
    /// Initial retry backoff (ms), doubled each attempt
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_max_output_tokens() -> usize {
    1024
}

fn default_temperature() -> f32 {
    0.2
}

fn default_generation_retries() -> u32 {
    1
}

fn default_initial_backoff_ms() -> u64 {
    200
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            generation_retries: default_generation_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// Tool agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum reasoning-loop iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Per-tool execution timeout (seconds)
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

fn default_max_iterations() -> usize {
    agent::MAX_ITERATIONS
}

fn default_tool_timeout_secs() -> u64 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

/// Conversation store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Token budget for the history window
    #[serde(default = "default_history_token_budget")]
    pub history_token_budget: usize,
}

fn default_history_token_budget() -> usize {
    conversation::DEFAULT_HISTORY_TOKEN_BUDGET
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_token_budget: default_history_token_budget(),
        }
    }
}

/// Suggestion searcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionConfig {
    /// Path to the precomputed suggestion index (JSON)
    #[serde(default)]
    pub index_path: Option<String>,
    /// Number of follow-ups returned
    #[serde(default = "default_suggestion_top_n")]
    pub top_n: usize,
    /// Cosine similarity floor
    #[serde(default = "default_similarity_floor")]
    pub similarity_floor: f32,
    /// Lookup timeout (ms)
    #[serde(default = "default_suggestion_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_suggestion_top_n() -> usize {
    suggestions::DEFAULT_TOP_N
}

fn default_similarity_floor() -> f32 {
    suggestions::SIMILARITY_FLOOR
}

fn default_suggestion_timeout_ms() -> u64 {
    suggestions::TIMEOUT_MS
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            index_path: None,
            top_n: default_suggestion_top_n(),
            similarity_floor: default_similarity_floor(),
            timeout_ms: default_suggestion_timeout_ms(),
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file plus `ADVISOR_*` env overrides
    ///
    /// Example override: `ADVISOR_RAG__TOP_K=8`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(Environment::with_prefix("ADVISOR").separator("__"));

        let settings: Settings = builder
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.rag.dense_weight) {
            return Err(ConfigError::InvalidValue {
                field: "rag.dense_weight".to_string(),
                message: format!("must be between 0.0 and 1.0, got {}", self.rag.dense_weight),
            });
        }

        if !(0.0..=1.0).contains(&self.rag.single_source_penalty) {
            return Err(ConfigError::InvalidValue {
                field: "rag.single_source_penalty".to_string(),
                message: format!(
                    "must be between 0.0 and 1.0, got {}",
                    self.rag.single_source_penalty
                ),
            });
        }

        if self.rag.top_k == 0 || self.rag.top_k > self.rag.candidate_k {
            return Err(ConfigError::InvalidValue {
                field: "rag.top_k".to_string(),
                message: format!(
                    "must be between 1 and candidate_k ({}), got {}",
                    self.rag.candidate_k, self.rag.top_k
                ),
            });
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_iterations".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.conversation.history_token_budget == 0 {
            return Err(ConfigError::InvalidValue {
                field: "conversation.history_token_budget".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.suggestions.similarity_floor) {
            return Err(ConfigError::InvalidValue {
                field: "suggestions.similarity_floor".to_string(),
                message: format!(
                    "must be between 0.0 and 1.0, got {}",
                    self.suggestions.similarity_floor
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.rag.top_k, 5);
        assert_eq!(settings.agent.max_iterations, 5);
    }

    #[test]
    fn test_invalid_dense_weight_rejected() {
        let mut settings = Settings::default();
        settings.rag.dense_weight = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_top_k_bounded_by_candidate_k() {
        let mut settings = Settings::default();
        settings.rag.top_k = settings.rag.candidate_k + 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let mut settings = Settings::default();
        settings.conversation.history_token_budget = 0;
        assert!(settings.validate().is_err());
    }
}
