//! Error taxonomy for the query pipeline
//!
//! The taxonomy mirrors the pipeline's fallback policy: terminal gate
//! verdicts (`InputRejected`, `OutOfScope`), recoverable degradations that
//! are absorbed at the stage boundary (`StageDegraded`), and critical
//! failures that exhaust their retry budget (`StageFailed`). Only
//! `StageFailed` conditions are surfaced for operator alerting; the user
//! always receives natural-language text.

use thiserror::Error;

/// Result alias using the core error type
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stages, used to attribute degradations and failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalization,
    Gate,
    Routing,
    Retrieval,
    Generation,
    AgentLoop,
    Persistence,
    Suggestions,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Normalization => "normalization",
            Stage::Gate => "gate",
            Stage::Routing => "routing",
            Stage::Retrieval => "retrieval",
            Stage::Generation => "generation",
            Stage::AgentLoop => "agent_loop",
            Stage::Persistence => "persistence",
            Stage::Suggestions => "suggestions",
        };
        write!(f, "{}", name)
    }
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Prompt injection detected; terminal, answered with a fixed refusal
    #[error("input rejected: prompt injection detected")]
    InputRejected,

    /// Query is outside the admissions domain; terminal, fixed response
    #[error("query out of configured domain scope")]
    OutOfScope,

    /// A non-critical stage failed and was bypassed; the response is still
    /// produced and flagged as degraded
    #[error("stage degraded: {stage}: {reason}")]
    StageDegraded { stage: Stage, reason: String },

    /// A critical stage failed after its retry budget; the response is a
    /// fixed apology but the condition must be surfaced to operators
    #[error("stage failed: {stage}: {reason}")]
    StageFailed { stage: Stage, reason: String },

    /// An agent tool received unusable arguments; reported to the user as a
    /// clarification request, not a system error
    #[error("invalid tool input: {0}")]
    InvalidToolInput(String),

    /// Configuration error at startup
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Storage-layer error from the conversation store
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn degraded(stage: Stage, reason: impl Into<String>) -> Self {
        Self::StageDegraded {
            stage,
            reason: reason.into(),
        }
    }

    pub fn failed(stage: Stage, reason: impl Into<String>) -> Self {
        Self::StageFailed {
            stage,
            reason: reason.into(),
        }
    }

    /// Whether this error must be surfaced for external alerting
    pub fn is_critical(&self) -> bool {
        matches!(self, Error::StageFailed { .. } | Error::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criticality() {
        assert!(Error::failed(Stage::Generation, "timeout").is_critical());
        assert!(!Error::degraded(Stage::Normalization, "low confidence").is_critical());
        assert!(!Error::InputRejected.is_critical());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::AgentLoop.to_string(), "agent_loop");
        assert_eq!(Stage::Retrieval.to_string(), "retrieval");
    }
}
