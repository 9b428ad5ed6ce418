//! LLM access for the admissions advisor
//!
//! Exposes the [`LlmBackend`] trait consumed by the chat composer and the
//! tool agent, an Ollama-compatible HTTP implementation with retry and
//! backoff, and the Vietnamese prompt templates.

pub mod backend;
pub mod prompt;

pub use backend::{ChatBackend, FinishReason, GenerationResult, LlmBackend, LlmConfig};
pub use prompt::{
    format_context_block, Message, Role, AGENT_SYSTEM_PROMPT, GROUNDED_SYSTEM_PROMPT,
};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(std::time::Duration::from_secs(0))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
