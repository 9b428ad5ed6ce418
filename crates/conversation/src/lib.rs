//! Per-room conversation log with token-budget windows
//!
//! Rooms are fully independent. Appends within one room are linearized;
//! different rooms never contend with each other. The window handed to
//! generation is recomputed on every read, never persisted.

pub mod store;
pub mod window;

pub use store::{ConversationStore, InMemoryStore};
pub use window::ConversationWindow;

use thiserror::Error;

/// Conversation storage errors
///
/// Storage failures are surfaced, never swallowed; losing a turn silently
/// would break conversation continuity guarantees.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
}
