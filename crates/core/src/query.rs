//! Query and routing types
//!
//! A `Query` is immutable once received. The `QueryContext` derived from it
//! is built once per request by the orchestrator and never mutated after the
//! routing decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One incoming user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Conversation room identifier
    pub room_id: String,
    /// Raw query text as received
    pub text: String,
    /// Arrival timestamp
    pub received_at: DateTime<Utc>,
}

impl Query {
    pub fn new(room_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// Detected language of the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedLanguage {
    /// ISO 639-1 style code reported by the identifier
    Known(String),
    /// Identification failed or fell below the confidence floor
    Unknown,
}

impl DetectedLanguage {
    pub fn code(&self) -> &str {
        match self {
            DetectedLanguage::Known(code) => code,
            DetectedLanguage::Unknown => "unknown",
        }
    }

    pub fn is_vietnamese(&self) -> bool {
        matches!(self, DetectedLanguage::Known(code) if code == "vi")
    }
}

/// Verdict from the safety and domain gate
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Prompt-injection risk was flagged
    pub injection: bool,
    /// Query is plausibly an admissions/academic question
    pub in_domain: bool,
    /// Confidence of the injection classifier
    pub injection_confidence: f32,
    /// Confidence of the domain classifier
    pub domain_confidence: f32,
}

impl GateVerdict {
    /// Fail-closed verdict used when a classifier errors: treat the input
    /// as risky rather than leaking an ungated query downstream.
    pub fn fail_closed() -> Self {
        Self {
            injection: true,
            in_domain: false,
            injection_confidence: 0.0,
            domain_confidence: 0.0,
        }
    }

    pub fn passed(&self) -> bool {
        !self.injection && self.in_domain
    }
}

/// Answering strategy chosen for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Knowledge lookup with citation-backed generation
    RetrievalAnswer,
    /// Deterministic computation through the tool agent
    AgentTool,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::RetrievalAnswer => "retrieval_answer",
            Route::AgentTool => "agent_tool",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-request context derived from a `Query`
///
/// Owned by the orchestrator for the request's lifetime. Exactly one route
/// is chosen; none of the fields change after the routing decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryContext {
    /// Detected language code
    pub language: DetectedLanguage,
    /// Normalized (tone-restored) query text
    pub normalized_text: String,
    /// Gate verdict
    pub verdict: GateVerdict,
    /// Chosen route
    pub route: Route,
    /// Normalization was bypassed due to a model failure
    pub normalization_degraded: bool,
}
