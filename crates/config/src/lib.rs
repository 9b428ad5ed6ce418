//! Configuration for the admissions advisor
//!
//! Settings are built once at startup from a TOML file plus `ADVISOR_*`
//! environment overrides, validated, and passed down by reference. No code
//! reads ambient process state mid-request.

pub mod constants;
pub mod settings;

pub use settings::{
    AgentConfig, ChatConfig, ConversationConfig, GateConfig, ModelEndpoints, NormalizerConfig,
    RagConfig, ServerConfig, Settings, SuggestionConfig,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
