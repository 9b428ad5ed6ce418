//! Query preprocessing: normalization, gating and routing
//!
//! Three request-path stages run here before any retrieval or generation:
//! the lexical normalizer (language identification plus Vietnamese tone
//! restoration), the safety and domain gate, and the route classifier. All
//! model calls go through the provider traits in [`providers`], so the
//! pipeline never depends on a specific provider's wire format.

pub mod gate;
pub mod normalizer;
pub mod providers;
pub mod router;

pub use gate::SafetyDomainGate;
pub use normalizer::{LexicalNormalizer, NormalizedQuery};
pub use providers::{
    BinaryClassifier, Classification, GatewayClient, LanguageId, LanguageIdentifier,
    RouteClassifier, RouteDecision, ToneRestorer,
};
pub use router::QueryRouter;

use thiserror::Error;

/// Model-provider errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("network error: {0}")]
    Network(String),

    #[error("model returned malformed output: {0}")]
    Malformed(String),

    #[error("timeout")]
    Timeout,
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout
        } else {
            ModelError::Network(err.to_string())
        }
    }
}
