//! Grounded chat composer

use std::sync::Arc;

use advisor_config::constants::responses;
use advisor_conversation::ConversationWindow;
use advisor_core::{Citation, Error, RetrievalResult, Stage, TurnRole};
use advisor_llm::{format_context_block, LlmBackend, Message, GROUNDED_SYSTEM_PROMPT};

use crate::citations::format_citation_block;

/// Final composed answer
#[derive(Debug)]
pub struct ComposedAnswer {
    /// Answer text with the citation block already appended
    pub text: String,
    /// Citations backing the answer, one per retrieved chunk used
    pub citations: Vec<Citation>,
    /// A stage in the composition degraded or failed
    pub degraded: bool,
    /// Critical failure absorbed here, kept for operator reporting
    pub failure: Option<Error>,
}

/// Composes cited answers from retrieval evidence and history
///
/// Generation retries live inside the backend; when the retry budget is
/// exhausted the composer absorbs the failure and answers with the fixed
/// apology so the pipeline still terminates with natural-language text.
pub struct GroundedComposer {
    backend: Arc<dyn LlmBackend>,
}

impl GroundedComposer {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Build the message sequence for one generation request
    fn build_messages(
        query: &str,
        retrieval: &RetrievalResult,
        window: &ConversationWindow,
    ) -> Vec<Message> {
        let chunks: Vec<(String, String)> = retrieval
            .entries()
            .iter()
            .map(|e| (e.chunk.id.clone(), e.chunk.content.clone()))
            .collect();

        let system = format!("{}\n\n{}", GROUNDED_SYSTEM_PROMPT, format_context_block(&chunks));

        let mut messages = vec![Message::system(system)];
        for turn in window.turns() {
            messages.push(match turn.role {
                TurnRole::User => Message::user(&turn.content),
                TurnRole::Assistant => Message::assistant(&turn.content),
            });
        }
        messages.push(Message::user(query));
        messages
    }

    /// Compose a cited answer for one request
    ///
    /// Never returns an error; a generation failure yields the fixed
    /// apology with no citations and the failure attached for reporting.
    pub async fn compose(
        &self,
        query: &str,
        retrieval: &RetrievalResult,
        window: &ConversationWindow,
    ) -> ComposedAnswer {
        let messages = Self::build_messages(query, retrieval, window);

        match self.backend.generate(&messages).await {
            Ok(result) => {
                let citations: Vec<Citation> = retrieval
                    .entries()
                    .iter()
                    .map(|e| Citation::from_chunk(&e.chunk))
                    .collect();

                let block = format_citation_block(&citations);
                let text = if block.is_empty() {
                    result.text.trim().to_string()
                } else {
                    format!("{}\n\n{}", result.text.trim(), block)
                };

                ComposedAnswer {
                    text,
                    citations,
                    degraded: retrieval.degraded,
                    failure: None,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "generation failed after retry budget");
                ComposedAnswer {
                    text: responses::GENERATION_APOLOGY.to_string(),
                    citations: Vec::new(),
                    degraded: true,
                    failure: Some(Error::failed(Stage::Generation, e.to_string())),
                }
            }
        }
    }
}
