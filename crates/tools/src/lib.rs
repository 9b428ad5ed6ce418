//! Deterministic tools callable by the reasoning agent
//!
//! Each tool is a typed function behind the [`Tool`] trait: subject
//! combination scoring, admission cutoff comparison (national graduation
//! exam and DGNL competency assessment), and knowledge-base search. Tools
//! never panic on bad user input; malformed values come back as structured
//! results the agent can relay as a clarification request.

pub mod cutoffs;
pub mod registry;
pub mod retrieval;
pub mod subjects;

pub use cutoffs::{CompetencyCutoffTool, GraduationCutoffTool};
pub use registry::{scoring_registry, ToolRegistry, DEFAULT_TOOL_TIMEOUT_SECS};
pub use retrieval::KnowledgeSearchTool;
pub use subjects::SubjectScoreTool;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Tool execution errors
#[derive(Error, Debug, Clone)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    NotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidParams(String),

    #[error("tool execution failed: {0}")]
    Execution(String),

    #[error("tool {name} timed out after {secs}s")]
    Timeout { name: String, secs: u64 },
}

impl ToolError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// True when the agent should ask the user for better input rather
    /// than treat the failure as a system error.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidParams(_))
    }
}

/// Structured tool result handed back to the agent
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub value: Value,
}

impl ToolOutput {
    pub fn json(value: Value) -> Self {
        Self { value }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            value: Value::String(text.into()),
        }
    }

    /// Render for the agent's next model prompt
    pub fn to_prompt_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A callable, deterministic tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Per-tool override of the registry's execution timeout
    fn timeout_secs(&self) -> Option<u64> {
        None
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;
}

/// Outcome of one tool call, exhaustive over the ways a call can end
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    Success(ToolOutput),
    InvalidInput(String),
    Error(String),
}

/// Record of one tool call inside an agent run
///
/// Scoped to a single run; discarded with it.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Value,
    pub outcome: ToolOutcome,
    pub duration: Duration,
}
