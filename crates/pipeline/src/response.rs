//! Request and response types for the inbound interface

use advisor_core::{Citation, Route};
use serde::{Deserialize, Serialize};

/// Inbound chat request
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub room_id: String,
    pub query: String,
}

/// How a request was ultimately answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseRoute {
    RetrievalAnswer,
    AgentTool,
    Refused,
    OutOfScope,
}

impl From<Route> for ResponseRoute {
    fn from(route: Route) -> Self {
        match route {
            Route::RetrievalAnswer => ResponseRoute::RetrievalAnswer,
            Route::AgentTool => ResponseRoute::AgentTool,
        }
    }
}

impl ResponseRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseRoute::RetrievalAnswer => "retrieval_answer",
            ResponseRoute::AgentTool => "agent_tool",
            ResponseRoute::Refused => "refused",
            ResponseRoute::OutOfScope => "out_of_scope",
        }
    }
}

/// Final pipeline response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Answer text, citation block included when applicable
    pub response: String,
    /// Citations backing the answer
    pub citations: Vec<Citation>,
    /// Route the request took, for observability
    pub route: ResponseRoute,
    /// Suggested follow-up questions, possibly empty
    pub suggestions: Vec<String>,
    /// A stage degraded or failed while producing this answer
    pub degraded: bool,
}

impl ChatResponse {
    pub fn terminal(text: impl Into<String>, route: ResponseRoute) -> Self {
        Self {
            response: text.into(),
            citations: Vec::new(),
            route,
            suggestions: Vec::new(),
            degraded: false,
        }
    }
}
