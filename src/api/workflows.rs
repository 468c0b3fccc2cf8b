/// Workflow backend pass-through endpoints
///
/// Read-only listing plus execution of stored workflows. Requests go straight to the
/// configured [`WorkflowBackend`](crate::client::WorkflowBackend); listings come from its
/// query cache when warm.

use crate::{
    api::{AppError, AppState},
    client::models::{AiWorkflow, WorkflowExecution},
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;

/// Create workflow pass-through routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", get(list_workflows))
        .route("/api/workflows/{id}/execute", post(execute_workflow))
        .route("/api/workflows/{id}/executions", get(list_executions))
}

/// List stored workflows of the configured deployment
///
/// GET /api/workflows
async fn list_workflows(State(state): State<AppState>) -> Result<Json<Vec<AiWorkflow>>, AppError> {
    let workflows = state.sessions.backend().list_workflows().await?;
    tracing::debug!("📋 Listing {} workflows", workflows.len());
    Ok(Json(workflows))
}

/// Start an execution
///
/// POST /api/workflows/{id}/execute
/// Body (optional): any JSON value, passed as the execution input
async fn execute_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<WorkflowExecution>), AppError> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(format!("invalid execution input: {e}")))?
    };

    tracing::info!("🚀 Executing workflow: {}", workflow_id);
    let execution = state.sessions.backend().execute_workflow(&workflow_id, input).await?;
    Ok((StatusCode::ACCEPTED, Json(execution)))
}

async fn list_executions(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> Result<Json<Vec<WorkflowExecution>>, AppError> {
    let executions = state.sessions.backend().list_executions(&workflow_id).await?;
    Ok(Json(executions))
}
