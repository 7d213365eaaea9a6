//! HTTP control plane
//!
//! Thin CRUD surface over the knowledge base, the persona prompt file, the
//! voice-session worker process and the transcript directory. All retrieval
//! and conversation logic lives in the rag and agent crates; handlers here
//! only translate HTTP to engine calls.

pub mod agent_process;
pub mod bootstrap;
pub mod http;
pub mod state;

pub use agent_process::{AgentProcess, AgentStatus};
pub use http::create_router;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors, rendered as `{"detail": ...}` with a matching status
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<aidy_rag::RagError> for ServerError {
    fn from(err: aidy_rag::RagError) -> Self {
        ServerError::Internal(err.to_string())
    }
}
