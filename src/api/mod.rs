/// HTTP API Layer
///
/// This module provides the REST surface of the studio. It handles:
/// - Node palette lookup
/// - Editing sessions (graph actions, node panel, validation, save, import/export)
/// - Pass-through reads and executions against the workflow backend

// Node palette endpoint
pub mod palette;

// Editing session endpoints
pub mod sessions;

// Workflow backend pass-through endpoints
pub mod workflows;

pub use palette::create_palette_routes;
pub use sessions::create_session_routes;
pub use workflows::create_workflow_routes;

use crate::{
    client::{ApiError, WorkflowBackend},
    config::Config,
    session::{SessionError, SessionManager},
    workflow::{
        panel::PanelError,
        registry::NodeRegistry,
        store::StoreError,
    },
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Open editing sessions and the backend they save to
    pub sessions: Arc<SessionManager>,
    /// Palette served to clients
    pub registry: Arc<NodeRegistry>,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn WorkflowBackend>) -> Self {
        let sessions = SessionManager::new(backend, config.editor.history_limit);
        Self {
            sessions: Arc::new(sessions),
            registry: Arc::new(NodeRegistry::new()),
        }
    }
}

/// Error returned by handlers, rendered as `{ "error": "..." }` plus optional detail
#[derive(Debug)]
pub enum AppError {
    Session(SessionError),
    BadRequest(String),
}

impl<E: Into<SessionError>> From<E> for AppError {
    fn from(e: E) -> Self {
        AppError::Session(e.into())
    }
}

fn backend_status(e: &ApiError) -> StatusCode {
    match e.status() {
        Some(404) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::NodeNotFound(_) | StoreError::EdgeNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::KindMismatch { .. } => StatusCode::BAD_REQUEST,
        StoreError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = match self {
            AppError::BadRequest(message) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
            }
            AppError::Session(error) => error,
        };
        let message = error.to_string();
        let (status, body) = match &error {
            SessionError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            SessionError::PanelClosed | SessionError::SaveInFlight => {
                (StatusCode::CONFLICT, json!({ "error": message }))
            }
            SessionError::Panel(PanelError::NodeNotFound(_)) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            SessionError::Panel(PanelError::Store(e)) | SessionError::Store(e) => match e {
                StoreError::Rejected(reason) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "error": message, "rejection": reason }),
                ),
                other => (store_status(other), json!({ "error": message })),
            },
            SessionError::Panel(_) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            SessionError::Invalid(report) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "validation": report }),
            ),
            SessionError::Backend(e) => {
                tracing::error!("❌ Workflow backend request failed: {}", e);
                (backend_status(e), json!({ "error": message }))
            }
            SessionError::SaveTask(e) => {
                tracing::error!("❌ Save task aborted: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
        };
        (status, Json(body)).into_response()
    }
}
