//! Conversation turns and token estimation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deterministic token estimate for window budgeting
///
/// Vietnamese syllables are whitespace-separated and mostly map to one or
/// two generation-model tokens; diacritics inflate the byte count, so the
/// estimate works on grapheme clusters rather than bytes. Roughly one token
/// per three graphemes, with a floor of one token per word.
pub fn estimate_tokens(text: &str) -> usize {
    let graphemes = text.graphemes(true).count();
    let words = text.split_whitespace().count();
    (graphemes / 3).max(words).max(if text.is_empty() { 0 } else { 1 })
}

/// A single turn in a room's conversation log
///
/// Turns are append-only and owned exclusively by the conversation store.
/// The token count is computed once at construction so window trimming does
/// not depend on re-tokenization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Role of the speaker
    pub role: TurnRole,
    /// Message text
    pub content: String,
    /// Deterministic token count of the content
    pub token_count: usize,
    /// When the turn occurred
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        let content = content.into();
        let token_count = estimate_tokens(&content);
        Self {
            role,
            content,
            token_count,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_nonzero_for_text() {
        assert_eq!(estimate_tokens(""), 0);
        assert!(estimate_tokens("a") >= 1);
        assert!(estimate_tokens("học phí học thạc sĩ UIT là bao nhiêu?") >= 8);
    }

    #[test]
    fn test_estimate_tokens_deterministic() {
        let text = "Điểm chuẩn ngành Khoa học máy tính";
        assert_eq!(estimate_tokens(text), estimate_tokens(text));
    }

    #[test]
    fn test_turn_records_token_count() {
        let turn = Turn::user("xin chào");
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.token_count, estimate_tokens("xin chào"));
    }
}
