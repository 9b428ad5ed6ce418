//! HTTP endpoints

use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use advisor_core::Query;
use advisor_pipeline::{ChatRequest, ChatResponse};

use crate::state::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat/chatDomain", post(chat))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Chat endpoint
///
/// The orchestrator never errors; the only rejection here is an empty query.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorBody>)> {
    if request.query.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "query must not be empty".to_string(),
            }),
        ));
    }
    if request.room_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "room_id must not be empty".to_string(),
            }),
        ));
    }

    let response = state
        .orchestrator
        .handle(Query::new(request.room_id, request.query))
        .await;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthBody { status: "ok" })
}

/// Readiness check; degraded when the generation backend is unreachable
async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if state.llm.is_available().await {
        (StatusCode::OK, Json(HealthBody { status: "ready" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthBody {
                status: "llm unavailable",
            }),
        )
    }
}
