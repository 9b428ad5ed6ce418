//! Route classifier
//!
//! Chooses between the citation-backed retrieval path and the deterministic
//! tool agent. Ties, low confidence and classifier errors all default to
//! the retrieval route, the safer citation-backed path.

use std::sync::Arc;

use advisor_config::GateConfig;
use advisor_core::Route;

use crate::providers::RouteClassifier;

/// Query router
pub struct QueryRouter {
    classifier: Arc<dyn RouteClassifier>,
    config: GateConfig,
}

impl QueryRouter {
    pub fn new(classifier: Arc<dyn RouteClassifier>, config: GateConfig) -> Self {
        Self { classifier, config }
    }

    /// Decide the route for one gated, in-domain query
    pub async fn decide(&self, text: &str) -> Route {
        match self.classifier.route(text).await {
            Ok(decision) if decision.confidence >= self.config.min_route_confidence => {
                decision.route
            }
            Ok(decision) => {
                tracing::debug!(
                    route = %decision.route,
                    confidence = decision.confidence,
                    "route confidence below floor, defaulting to retrieval"
                );
                Route::RetrievalAnswer
            }
            Err(e) => {
                tracing::warn!(error = %e, "route classifier failed, defaulting to retrieval");
                Route::RetrievalAnswer
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::RouteDecision;
    use crate::ModelError;
    use async_trait::async_trait;

    struct FixedRouter(Option<(Route, f32)>);

    #[async_trait]
    impl RouteClassifier for FixedRouter {
        async fn route(&self, _text: &str) -> Result<RouteDecision, ModelError> {
            self.0
                .map(|(route, confidence)| RouteDecision { route, confidence })
                .ok_or_else(|| ModelError::Network("down".into()))
        }
    }

    fn router(decision: Option<(Route, f32)>) -> QueryRouter {
        QueryRouter::new(Arc::new(FixedRouter(decision)), GateConfig::default())
    }

    #[tokio::test]
    async fn test_confident_agent_route_kept() {
        let route = router(Some((Route::AgentTool, 0.92)))
            .decide("điểm của em có đậu khoa học máy tính không?")
            .await;
        assert_eq!(route, Route::AgentTool);
    }

    #[tokio::test]
    async fn test_low_confidence_defaults_to_retrieval() {
        let route = router(Some((Route::AgentTool, 0.3))).decide("x").await;
        assert_eq!(route, Route::RetrievalAnswer);
    }

    #[tokio::test]
    async fn test_error_defaults_to_retrieval() {
        let route = router(None).decide("x").await;
        assert_eq!(route, Route::RetrievalAnswer);
    }
}
