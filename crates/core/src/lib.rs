//! Core types for the admissions advisor
//!
//! This crate provides foundational types used across all other crates:
//! - Error taxonomy (refusal, out-of-scope, degraded, failed stages)
//! - Query and routing types
//! - Knowledge-base chunk and retrieval types
//! - Conversation turns and token estimation
//! - Citation types

pub mod conversation;
pub mod document;
pub mod error;
pub mod query;

pub use conversation::{estimate_tokens, Turn, TurnRole};
pub use document::{
    Citation, ChunkMetadata, DocumentChunk, RetrievalResult, ScoredChunk, SuggestionEntry,
};
pub use error::{Error, Result, Stage};
pub use query::{DetectedLanguage, GateVerdict, Query, QueryContext, Route};
