//! Bounded tool-calling agent
//!
//! Runs the reasoning loop for computational admissions questions: the
//! model either emits a JSON tool call, which is executed and fed back, or
//! plain text, which ends the run as the final answer. The loop is a state
//! machine with an iteration counter; it never runs unbounded and every
//! way a tool call can end has an explicit variant.

use std::sync::Arc;
use std::time::Instant;

use advisor_config::constants::{agent, responses};
use advisor_conversation::ConversationWindow;
use advisor_core::{Error, Stage, TurnRole};
use advisor_llm::{LlmBackend, Message, AGENT_SYSTEM_PROMPT};
use advisor_tools::{ToolError, ToolInvocation, ToolOutcome, ToolRegistry};
use serde_json::Value;

/// Agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum reasoning iterations before the degraded fallback
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: agent::MAX_ITERATIONS,
        }
    }
}

/// Outcome of one agent run
#[derive(Debug)]
pub struct AgentAnswer {
    pub text: String,
    /// The run ended on a fallback rather than a model answer
    pub degraded: bool,
    /// Tool calls made during the run, for observability
    pub invocations: Vec<ToolInvocation>,
    /// Critical failure absorbed here, kept for operator reporting
    pub failure: Option<Error>,
}

/// A parsed model reply
enum ModelReply {
    ToolCall { name: String, arguments: Value },
    FinalAnswer(String),
}

/// Tool-using reasoning agent
pub struct ToolAgent {
    backend: Arc<dyn LlmBackend>,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl ToolAgent {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            backend,
            registry,
            config,
        }
    }

    fn system_prompt(&self) -> String {
        let mut prompt = String::from(AGENT_SYSTEM_PROMPT);
        prompt.push_str("\n\nCÔNG CỤ:\n");
        let mut descriptions = self.registry.descriptions();
        descriptions.sort();
        for (name, description) in descriptions {
            prompt.push_str(&format!("- {}: {}\n", name, description));
        }
        prompt
    }

    /// A reply is a tool call only if it parses as a JSON object with a
    /// "tool" field; anything else is the final answer.
    fn parse_reply(text: &str) -> ModelReply {
        let trimmed = text.trim();
        let candidate = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|s| s.strip_suffix("```"))
            .map(str::trim)
            .unwrap_or(trimmed);

        if candidate.starts_with('{') {
            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                if let Some(name) = value.get("tool").and_then(|v| v.as_str()) {
                    let arguments = value
                        .get("arguments")
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Default::default()));
                    return ModelReply::ToolCall {
                        name: name.to_string(),
                        arguments,
                    };
                }
            }
        }
        ModelReply::FinalAnswer(trimmed.to_string())
    }

    /// Run the bounded loop for one query
    pub async fn run(&self, query: &str, window: &ConversationWindow) -> AgentAnswer {
        let mut messages = vec![Message::system(self.system_prompt())];
        for turn in window.turns() {
            messages.push(match turn.role {
                TurnRole::User => Message::user(&turn.content),
                TurnRole::Assistant => Message::assistant(&turn.content),
            });
        }
        messages.push(Message::user(query));

        let mut invocations = Vec::new();

        for iteration in 0..self.config.max_iterations {
            let reply = match self.backend.generate(&messages).await {
                Ok(result) => result.text,
                Err(e) => {
                    tracing::error!(error = %e, iteration, "agent generation failed");
                    return AgentAnswer {
                        text: responses::GENERATION_APOLOGY.to_string(),
                        degraded: true,
                        invocations,
                        failure: Some(Error::failed(Stage::AgentLoop, e.to_string())),
                    };
                }
            };

            let (name, arguments) = match Self::parse_reply(&reply) {
                ModelReply::FinalAnswer(text) => {
                    return AgentAnswer {
                        text,
                        degraded: false,
                        invocations,
                        failure: None,
                    };
                }
                ModelReply::ToolCall { name, arguments } => (name, arguments),
            };

            tracing::debug!(tool = %name, iteration, "agent tool call");
            let started = Instant::now();
            let result = self.registry.execute(&name, arguments.clone()).await;
            let duration = started.elapsed();

            let feedback = match &result {
                Ok(output) => {
                    invocations.push(ToolInvocation {
                        name: name.clone(),
                        arguments,
                        outcome: ToolOutcome::Success(output.clone()),
                        duration,
                    });
                    format!("KẾT QUẢ CÔNG CỤ {}: {}", name, output.to_prompt_text())
                }
                Err(e @ ToolError::InvalidParams(_)) => {
                    invocations.push(ToolInvocation {
                        name: name.clone(),
                        arguments,
                        outcome: ToolOutcome::InvalidInput(e.to_string()),
                        duration,
                    });
                    format!(
                        "CÔNG CỤ {} BÁO THAM SỐ KHÔNG HỢP LỆ: {}. \
                         Hãy hỏi lại người dùng để làm rõ thông tin còn thiếu.",
                        name, e
                    )
                }
                Err(e @ ToolError::NotFound(_)) => {
                    invocations.push(ToolInvocation {
                        name: name.clone(),
                        arguments,
                        outcome: ToolOutcome::Error(e.to_string()),
                        duration,
                    });
                    format!(
                        "Không có công cụ tên {}. Chỉ dùng các công cụ đã liệt kê.",
                        name
                    )
                }
                Err(e) => {
                    // execution failure or timeout, not recoverable inside the run
                    tracing::error!(tool = %name, error = %e, "agent tool failed");
                    invocations.push(ToolInvocation {
                        name: name.clone(),
                        arguments,
                        outcome: ToolOutcome::Error(e.to_string()),
                        duration,
                    });
                    return AgentAnswer {
                        text: responses::GENERATION_APOLOGY.to_string(),
                        degraded: true,
                        invocations,
                        failure: Some(Error::failed(Stage::AgentLoop, e.to_string())),
                    };
                }
            };

            messages.push(Message::assistant(reply));
            messages.push(Message::user(feedback));
        }

        tracing::warn!(
            max_iterations = self.config.max_iterations,
            "agent exhausted its iteration budget"
        );
        AgentAnswer {
            text: responses::AGENT_INSUFFICIENT.to_string(),
            degraded: true,
            invocations,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_llm::{FinishReason, GenerationResult, LlmError};
    use advisor_tools::scoring_registry;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, ()>>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<&str, ()>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(String::from))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(&self, _: &[Message]) -> Result<GenerationResult, LlmError> {
            match self.replies.lock().pop_front() {
                Some(Ok(text)) => Ok(GenerationResult {
                    text,
                    tokens: 1,
                    total_time_ms: 1,
                    finish_reason: FinishReason::Stop,
                }),
                Some(Err(())) => Err(LlmError::Network("down".to_string())),
                None => panic!("backend queried more times than scripted"),
            }
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn agent(replies: Vec<Result<&str, ()>>) -> ToolAgent {
        ToolAgent::new(
            Arc::new(ScriptedBackend::new(replies)),
            Arc::new(scoring_registry()),
            AgentConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_tool_call_then_final_answer() {
        let agent = agent(vec![
            Ok(r#"{"tool": "sum_subjects", "arguments": {"subject_a_name": "toan", "subject_b_name": "ly", "subject_c_name": "hoa", "subject_a_point": 8.0, "subject_b_point": 7.5, "subject_c_point": 9.0}}"#),
            Ok("Tổng điểm của bạn là 24.5, tổ hợp A00."),
        ]);

        let answer = agent.run("điểm của em", &ConversationWindow::empty(100)).await;

        assert!(!answer.degraded);
        assert_eq!(answer.text, "Tổng điểm của bạn là 24.5, tổ hợp A00.");
        assert_eq!(answer.invocations.len(), 1);
        assert_eq!(answer.invocations[0].name, "sum_subjects");
        assert!(matches!(
            answer.invocations[0].outcome,
            ToolOutcome::Success(_)
        ));
    }

    #[tokio::test]
    async fn test_plain_text_is_final_answer() {
        let agent = agent(vec![Ok("Em cần cho biết điểm ba môn nhé.")]);
        let answer = agent.run("em đậu không?", &ConversationWindow::empty(100)).await;
        assert_eq!(answer.text, "Em cần cho biết điểm ba môn nhé.");
        assert!(answer.invocations.is_empty());
    }

    #[tokio::test]
    async fn test_fenced_json_parsed_as_tool_call() {
        let agent = agent(vec![
            Ok("```json\n{\"tool\": \"compare_competency_cutoffs\", \"arguments\": {\"score\": 930, \"year\": 2024}}\n```"),
            Ok("Với 930 điểm ĐGNL bạn đậu nhiều ngành."),
        ]);
        let answer = agent.run("930 điểm ĐGNL", &ConversationWindow::empty(100)).await;
        assert_eq!(answer.invocations.len(), 1);
        assert_eq!(answer.invocations[0].name, "compare_competency_cutoffs");
    }

    #[tokio::test]
    async fn test_iteration_exhaustion_degrades() {
        let call = r#"{"tool": "compare_competency_cutoffs", "arguments": {"score": 900, "year": 2024}}"#;
        let agent = agent(vec![Ok(call); agent::MAX_ITERATIONS]);

        let answer = agent.run("điểm chuẩn?", &ConversationWindow::empty(100)).await;

        assert!(answer.degraded);
        assert_eq!(answer.text, responses::AGENT_INSUFFICIENT);
        assert_eq!(answer.invocations.len(), agent::MAX_ITERATIONS);
        assert!(answer.failure.is_none());
    }

    #[tokio::test]
    async fn test_invalid_tool_input_leads_to_clarification() {
        let agent = agent(vec![
            Ok(r#"{"tool": "sum_subjects", "arguments": {"subject_a_name": "toan"}}"#),
            Ok("Bạn vui lòng cho biết đủ ba môn và điểm từng môn nhé."),
        ]);

        let answer = agent.run("tính điểm giúp em", &ConversationWindow::empty(100)).await;

        assert!(!answer.degraded);
        assert!(matches!(
            answer.invocations[0].outcome,
            ToolOutcome::InvalidInput(_)
        ));
        assert!(answer.text.contains("ba môn"));
    }

    #[tokio::test]
    async fn test_unknown_tool_fed_back() {
        let agent = agent(vec![
            Ok(r#"{"tool": "lookup_dorms", "arguments": {}}"#),
            Ok("Mình chưa hỗ trợ câu hỏi này."),
        ]);
        let answer = agent.run("ký túc xá?", &ConversationWindow::empty(100)).await;
        assert!(matches!(
            answer.invocations[0].outcome,
            ToolOutcome::Error(_)
        ));
        assert!(!answer.degraded);
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back() {
        let agent = agent(vec![Err(())]);
        let answer = agent.run("câu hỏi", &ConversationWindow::empty(100)).await;
        assert_eq!(answer.text, responses::GENERATION_APOLOGY);
        assert!(answer.degraded);
        assert!(matches!(
            answer.failure,
            Some(Error::StageFailed {
                stage: Stage::AgentLoop,
                ..
            })
        ));
    }
}
