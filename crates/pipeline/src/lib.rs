//! Query orchestration pipeline
//!
//! Composes the normalizer, gate, router, retriever, composer, agent,
//! conversation store and suggestion searcher into the per-request decision
//! cascade. One request in, one cited natural-language answer out; every
//! stage failure is absorbed into a degraded or fixed response before it
//! can reach the caller.

pub mod orchestrator;
pub mod response;

pub use orchestrator::{Orchestrator, PipelineConfig};
pub use response::{ChatRequest, ChatResponse, ResponseRoute};
