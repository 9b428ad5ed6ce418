//! LLM backend implementations
//!
//! The [`ChatBackend`] talks to an Ollama-compatible `/api/chat` endpoint.
//! Transient failures are retried with exponential backoff; every request
//! carries the configured timeout so no generation call can wait unbounded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::prompt::{Message, Role};
use crate::LlmError;

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// API endpoint
    pub endpoint: String,
    /// API key (optional)
    pub api_key: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry)
    pub initial_backoff: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "qwen3:4b-instruct-2507-q4_K_M".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
            max_tokens: 1024,
            temperature: 0.2,
            timeout: Duration::from_secs(30),
            max_retries: 1,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

impl LlmConfig {
    /// Build from application settings
    pub fn from_settings(settings: &advisor_config::Settings) -> Self {
        Self {
            model: settings.models.llm_model.clone(),
            endpoint: settings.models.llm_endpoint.clone(),
            api_key: settings.models.llm_api_key.clone(),
            max_tokens: settings.chat.max_output_tokens,
            temperature: settings.chat.temperature,
            timeout: Duration::from_millis(settings.models.llm_timeout_ms),
            max_retries: settings.chat.generation_retries,
            initial_backoff: Duration::from_millis(settings.chat.initial_backoff_ms),
        }
    }
}

/// Generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generated text
    pub text: String,
    /// Tokens generated
    pub tokens: usize,
    /// Total generation time (ms)
    pub total_time_ms: u64,
    /// Finish reason
    pub finish_reason: FinishReason,
}

/// Finish reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Error,
}

/// LLM backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a response for the given messages
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError>;

    /// Check if the model is reachable
    async fn is_available(&self) -> bool;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Ollama-compatible chat backend
#[derive(Clone)]
pub struct ChatBackend {
    client: Client,
    config: LlmConfig,
}

impl ChatBackend {
    /// Create a new backend
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint, path)
    }

    /// 5xx and transport errors are retryable; 4xx are not
    fn is_retryable(err: &LlmError) -> bool {
        matches!(err, LlmError::Network(_) | LlmError::Timeout(_))
    }

    async fn execute_request(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let mut builder = self.client.post(self.api_url("/chat")).json(request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("server error {}: {}", status, error)));
            }
            return Err(LlmError::Api(error));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| LlmError::Api(format!("malformed response: {}", e)))
    }
}

/// Drive an attempt to completion, retrying retryable failures with a
/// doubling backoff. Non-retryable errors abort immediately.
async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    initial_backoff: Duration,
    mut attempt_fn: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, LlmError>>,
{
    let mut last_error = None;
    let mut backoff = initial_backoff;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            tracing::warn!(
                attempt,
                max_retries,
                backoff_ms = backoff.as_millis() as u64,
                "generation request failed, retrying"
            );
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }

        match attempt_fn().await {
            Ok(result) => return Ok(result),
            Err(e) if ChatBackend::is_retryable(&e) => {
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| LlmError::Network("max retries exceeded".to_string())))
}

#[async_trait]
impl LlmBackend for ChatBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens as i32,
            },
        };

        let result = retry_with_backoff(self.config.max_retries, self.config.initial_backoff, || {
            self.execute_request(&request)
        })
        .await?;

        Ok(GenerationResult {
            text: result.message.content,
            tokens: result.eval_count.unwrap_or(0) as usize,
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason: if result.done {
                FinishReason::Stop
            } else {
                FinishReason::Length
            },
        })
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(self.api_url("/tags"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
    done: bool,
    eval_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_config_default() {
        let config = LlmConfig::default();
        assert_eq!(config.max_retries, 1);
        assert!(config.timeout >= Duration::from_secs(1));
    }

    #[test]
    fn test_message_conversion() {
        let msg = Message::user("xin chào");
        let chat: ChatMessage = (&msg).into();
        assert_eq!(chat.role, "user");
        assert_eq!(chat.content, "xin chào");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ChatBackend::is_retryable(&LlmError::Network("x".into())));
        assert!(ChatBackend::is_retryable(&LlmError::Timeout(
            Duration::from_secs(1)
        )));
        assert!(!ChatBackend::is_retryable(&LlmError::Api("bad".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retried_then_succeeds() {
        let calls = AtomicU32::new(0);

        let result = retry_with_backoff(1, Duration::from_millis(200), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(LlmError::Network("server error 503".into()))
                } else {
                    Ok("học phí là 15 triệu".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "học phí là 15 triệu");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_failure_aborts_on_first_attempt() {
        let calls = AtomicU32::new(0);

        let result: Result<String, _> = retry_with_backoff(3, Duration::from_millis(200), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(LlmError::Api("bad request".into())) }
        })
        .await;

        assert!(matches!(result, Err(LlmError::Api(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_returns_last_error() {
        let calls = AtomicU32::new(0);

        let result: Result<String, _> = retry_with_backoff(2, Duration::from_millis(200), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(LlmError::Network("connection refused".into())) }
        })
        .await;

        assert!(matches!(result, Err(LlmError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
