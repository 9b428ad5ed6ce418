//! HTTP server for the admissions advisor
//!
//! Wires every pipeline collaborator from [`advisor_config::Settings`] at
//! startup and exposes the chat endpoint plus health checks over axum.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;
