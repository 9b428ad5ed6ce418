//! Orchestrator state machine
//!
//! One request walks `Received -> Normalized -> Gated -> Routed -> Answered
//! -> Persisted -> Done`, with the gate short-circuiting to `Refused` or
//! `OutOfScope`. Both conversation turns are appended before returning,
//! even when the answer is a degraded fallback, so a failing stage never
//! breaks conversation continuity.

use std::sync::Arc;
use std::time::Duration;

use advisor_agent::ToolAgent;
use advisor_chat::GroundedComposer;
use advisor_config::constants::responses;
use advisor_config::Settings;
use advisor_conversation::{ConversationStore, ConversationWindow};
use advisor_core::{Citation, Query, QueryContext, Route, Turn};
use advisor_preprocess::{LexicalNormalizer, QueryRouter, SafetyDomainGate};
use advisor_rag::{HybridRetriever, SuggestionSearcher};

use crate::response::{ChatResponse, ResponseRoute};

/// Pipeline states, used for transition logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Received,
    Normalized,
    Gated,
    Refused,
    OutOfScope,
    Routed,
    Answered,
    Persisted,
    Done,
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Token budget for the history window handed to generation
    pub history_token_budget: usize,
    /// Suggestion lookup timeout
    pub suggestion_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        use advisor_config::constants::{conversation, suggestions};
        Self {
            history_token_budget: conversation::DEFAULT_HISTORY_TOKEN_BUDGET,
            suggestion_timeout: Duration::from_millis(suggestions::TIMEOUT_MS),
        }
    }
}

impl PipelineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            history_token_budget: settings.conversation.history_token_budget,
            suggestion_timeout: Duration::from_millis(settings.suggestions.timeout_ms),
        }
    }
}

/// Top-level request orchestrator
///
/// Every collaborator is constructed once at startup and injected here;
/// nothing is looked up or re-created mid-request.
pub struct Orchestrator {
    normalizer: Arc<LexicalNormalizer>,
    gate: Arc<SafetyDomainGate>,
    router: Arc<QueryRouter>,
    retriever: Arc<HybridRetriever>,
    composer: Arc<GroundedComposer>,
    agent: Arc<ToolAgent>,
    store: Arc<dyn ConversationStore>,
    suggestions: Option<Arc<SuggestionSearcher>>,
    config: PipelineConfig,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        normalizer: Arc<LexicalNormalizer>,
        gate: Arc<SafetyDomainGate>,
        router: Arc<QueryRouter>,
        retriever: Arc<HybridRetriever>,
        composer: Arc<GroundedComposer>,
        agent: Arc<ToolAgent>,
        store: Arc<dyn ConversationStore>,
        suggestions: Option<Arc<SuggestionSearcher>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            normalizer,
            gate,
            router,
            retriever,
            composer,
            agent,
            store,
            suggestions,
            config,
        }
    }

    /// Handle one request to a terminal state
    ///
    /// Never returns an error; every terminal path yields natural-language
    /// text plus a route marker.
    pub async fn handle(&self, query: Query) -> ChatResponse {
        let mut state = State::Received;
        tracing::debug!(room_id = %query.room_id, ?state, "request received");

        // Received -> Normalized
        let normalized = self.normalizer.normalize(&query.text).await;
        state = State::Normalized;
        tracing::debug!(?state, language = normalized.language.code(), "query normalized");

        // Normalized -> Gated
        let verdict = self.gate.check(&normalized.text).await;
        state = State::Gated;
        tracing::debug!(
            ?state,
            injection = verdict.injection,
            in_domain = verdict.in_domain,
            "gate verdict"
        );

        if verdict.injection {
            state = State::Refused;
            tracing::warn!(room_id = %query.room_id, ?state, "injection flagged, refusing");
            let response =
                ChatResponse::terminal(responses::INJECTION_REFUSAL, ResponseRoute::Refused);
            self.persist(&query, &response.response).await;
            return response;
        }

        if !verdict.in_domain {
            state = State::OutOfScope;
            tracing::debug!(room_id = %query.room_id, ?state, "query out of domain");
            let response =
                ChatResponse::terminal(responses::OUT_OF_SCOPE, ResponseRoute::OutOfScope);
            self.persist(&query, &response.response).await;
            return response;
        }

        // Gated -> Routed; the context is immutable from here on
        let route = self.router.decide(&normalized.text).await;
        let context = QueryContext {
            language: normalized.language,
            normalized_text: normalized.text,
            verdict,
            route,
            normalization_degraded: normalized.degraded,
        };
        state = State::Routed;
        tracing::debug!(?state, route = %context.route, "route chosen");

        let window = self.window(&query.room_id).await;

        // Routed -> Answered
        let (text, citations, answer_degraded) = match context.route {
            Route::RetrievalAnswer => self.answer_with_retrieval(&context, &window).await,
            Route::AgentTool => {
                let answer = self.agent.run(&context.normalized_text, &window).await;
                (answer.text, Vec::new(), answer.degraded)
            }
        };
        state = State::Answered;
        tracing::debug!(?state, degraded = answer_degraded, "answer composed");

        // Answered -> Persisted, unconditionally
        self.persist(&query, &text).await;
        state = State::Persisted;
        tracing::debug!(?state, room_id = %query.room_id, "turns appended");

        // Persisted -> Done; suggestions never delay the answer past
        // their own timeout
        let suggestions = self.lookup_suggestions(&context.normalized_text).await;
        state = State::Done;
        tracing::debug!(?state, suggestions = suggestions.len(), "request complete");

        ChatResponse {
            response: text,
            citations,
            route: context.route.into(),
            suggestions,
            degraded: answer_degraded || context.normalization_degraded,
        }
    }

    async fn answer_with_retrieval(
        &self,
        context: &QueryContext,
        window: &ConversationWindow,
    ) -> (String, Vec<Citation>, bool) {
        let retrieval = match self.retriever.retrieve(&context.normalized_text).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "retrieval failed on all backends");
                return (responses::GENERATION_APOLOGY.to_string(), Vec::new(), true);
            }
        };

        let answer = self
            .composer
            .compose(&context.normalized_text, &retrieval, window)
            .await;
        if let Some(failure) = &answer.failure {
            tracing::error!(error = %failure, "composition failure absorbed");
        }
        (answer.text, answer.citations, answer.degraded)
    }

    async fn window(&self, room_id: &str) -> ConversationWindow {
        match self
            .store
            .window(room_id, self.config.history_token_budget)
            .await
        {
            Ok(window) => window,
            Err(e) => {
                tracing::warn!(error = %e, room_id, "history read failed, answering without it");
                ConversationWindow::empty(self.config.history_token_budget)
            }
        }
    }

    /// Append both turns; storage failures are surfaced for alerting but
    /// never replace an already computed answer.
    async fn persist(&self, query: &Query, answer: &str) {
        if let Err(e) = self
            .store
            .append(&query.room_id, Turn::user(&query.text))
            .await
        {
            tracing::error!(error = %e, room_id = %query.room_id, "failed to append user turn");
        }
        if let Err(e) = self
            .store
            .append(&query.room_id, Turn::assistant(answer))
            .await
        {
            tracing::error!(error = %e, room_id = %query.room_id, "failed to append assistant turn");
        }
    }

    async fn lookup_suggestions(&self, text: &str) -> Vec<String> {
        let Some(searcher) = &self.suggestions else {
            return Vec::new();
        };

        match tokio::time::timeout(self.config.suggestion_timeout, searcher.search(text)).await {
            Ok(Ok(suggestions)) => suggestions,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "suggestion lookup failed, returning none");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.suggestion_timeout.as_millis() as u64,
                    "suggestion lookup timed out, returning none"
                );
                Vec::new()
            }
        }
    }
}
