//! Model-provider traits and the HTTP gateway client
//!
//! Each collaborator is a function returning a result or a typed failure
//! within a timeout. The [`GatewayClient`] implements all of them against a
//! single classifier gateway; tests substitute their own implementations.

use std::time::Duration;

use advisor_core::Route;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Language identification output
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageId {
    /// ISO 639-1 style language code
    pub code: String,
    /// Classifier confidence (0.0 - 1.0)
    pub confidence: f32,
}

/// Binary classification output
#[derive(Debug, Clone, Deserialize)]
pub struct Classification {
    /// The classifier's positive label applies
    pub positive: bool,
    /// Classifier confidence (0.0 - 1.0)
    pub confidence: f32,
}

/// Route classification output
#[derive(Debug, Clone)]
pub struct RouteDecision {
    pub route: Route,
    pub confidence: f32,
}

/// Language-identification collaborator
#[async_trait]
pub trait LanguageIdentifier: Send + Sync {
    async fn identify(&self, text: &str) -> Result<LanguageId, ModelError>;
}

/// Tone-restoration collaborator for unmarked Vietnamese text
#[async_trait]
pub trait ToneRestorer: Send + Sync {
    async fn restore(&self, text: &str) -> Result<String, ModelError>;
}

/// Binary classifier collaborator (prompt injection, domain relevance)
#[async_trait]
pub trait BinaryClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, ModelError>;
}

/// Route classifier collaborator
#[async_trait]
pub trait RouteClassifier: Send + Sync {
    async fn route(&self, text: &str) -> Result<RouteDecision, ModelError>;
}

/// Classification task served by the gateway
#[derive(Debug, Clone, Copy)]
pub enum GatewayTask {
    LanguageId,
    ToneRestore,
    PromptInjection,
    DomainRelevance,
    RouteClassify,
}

impl GatewayTask {
    fn path(&self) -> &'static str {
        match self {
            GatewayTask::LanguageId => "/v1/language-id",
            GatewayTask::ToneRestore => "/v1/tone-restore",
            GatewayTask::PromptInjection => "/v1/classify/prompt-injection",
            GatewayTask::DomainRelevance => "/v1/classify/domain",
            GatewayTask::RouteClassify => "/v1/classify/route",
        }
    }
}

/// HTTP client for the classifier gateway
///
/// One client instance per task keeps the trait impls trivial while sharing
/// the underlying connection pool.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    task: GatewayTask,
}

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    text: &'a str,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, task: GatewayTask, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
            task,
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, text: &str) -> Result<T, ModelError> {
        let url = format!("{}{}", self.base_url, self.task.path());
        let response = self
            .client
            .post(&url)
            .json(&GatewayRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::Network(format!(
                "gateway returned {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ModelError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl LanguageIdentifier for GatewayClient {
    async fn identify(&self, text: &str) -> Result<LanguageId, ModelError> {
        self.post(text).await
    }
}

#[derive(Debug, Deserialize)]
struct ToneRestoreResponse {
    text: String,
}

#[async_trait]
impl ToneRestorer for GatewayClient {
    async fn restore(&self, text: &str) -> Result<String, ModelError> {
        let response: ToneRestoreResponse = self.post(text).await?;
        Ok(response.text)
    }
}

#[async_trait]
impl BinaryClassifier for GatewayClient {
    async fn classify(&self, text: &str) -> Result<Classification, ModelError> {
        self.post(text).await
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    route: String,
    confidence: f32,
}

#[async_trait]
impl RouteClassifier for GatewayClient {
    async fn route(&self, text: &str) -> Result<RouteDecision, ModelError> {
        let response: RouteResponse = self.post(text).await?;
        let route = match response.route.as_str() {
            "agent_tool" => Route::AgentTool,
            "retrieval_answer" => Route::RetrievalAnswer,
            other => {
                return Err(ModelError::Malformed(format!("unknown route label: {}", other)));
            }
        };
        Ok(RouteDecision {
            route,
            confidence: response.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_paths_distinct() {
        let paths = [
            GatewayTask::LanguageId.path(),
            GatewayTask::ToneRestore.path(),
            GatewayTask::PromptInjection.path(),
            GatewayTask::DomainRelevance.path(),
            GatewayTask::RouteClassify.path(),
        ];
        let unique: std::collections::HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len());
    }
}
