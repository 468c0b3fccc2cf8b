/// Editing session REST endpoints
///
/// Every mutation goes through the session's graph store reducer; responses carry the
/// refreshed [`SessionView`] so a client can re-render without a second request.

use crate::{
    api::{AppError, AppState},
    client::models::AiWorkflow,
    session::{PanelView, SessionError, SessionView},
    workflow::{
        store::{ActionOutcome, GraphAction},
        types::{WorkflowConfiguration, WorkflowExport},
        validation::ValidationReport,
    },
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Request body for session creation; an empty body opens a blank workflow
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub workflow_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub configuration: Option<WorkflowConfiguration>,
}

#[derive(Debug, Deserialize)]
pub struct OpenPanelRequest {
    pub node_id: String,
}

/// Field edits applied in key order; the first invalid value stops the batch
#[derive(Debug, Deserialize)]
pub struct PanelFieldsRequest {
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub outcome: ActionOutcome,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub workflow: AiWorkflow,
    pub session: SessionView,
}

/// Create editing session routes
pub fn create_session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/actions", post(apply_action))
        .route("/api/sessions/{id}/metadata", put(update_metadata))
        .route("/api/sessions/{id}/validation", get(validate_session))
        .route("/api/sessions/{id}/panel", post(open_panel).delete(close_panel))
        .route("/api/sessions/{id}/panel/fields", put(set_panel_fields))
        .route("/api/sessions/{id}/panel/commit", post(commit_panel))
        .route("/api/sessions/{id}/save", post(save_session))
        .route("/api/sessions/{id}/error", delete(dismiss_error))
        .route("/api/sessions/{id}/export", get(export_session))
        .route("/api/sessions/{id}/import", post(import_session))
}

/// Open a new editing session
///
/// POST /api/sessions
/// Body (optional): { "workflow_id": "..." }
async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let request: CreateSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!("❌ Invalid session request body: {}", e);
            AppError::BadRequest(format!("invalid request body: {e}"))
        })?
    };

    let (_, session) = state.sessions.create(request.workflow_id.as_deref()).await?;
    let view = session.lock().await.view();
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id).await?;
    let view = session.lock().await.view();
    Ok(Json(view))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SessionError::NotFound(id).into())
    }
}

/// Dispatch one graph action
///
/// POST /api/sessions/{id}/actions
/// Body: { "action": "connect", "connection": { "source": "...", "target": "..." } }
async fn apply_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(action): Json<GraphAction>,
) -> Result<Json<ActionResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    let outcome = session.dispatch(action)?;
    Ok(Json(ActionResponse { outcome, session: session.view() }))
}

async fn update_metadata(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MetadataRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.set_metadata(request.name, request.description, request.configuration);
    Ok(Json(session.view()))
}

async fn validate_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ValidationReport>, AppError> {
    let session = state.sessions.get(id).await?;
    let report = session.lock().await.validate();
    Ok(Json(report))
}

fn panel_view(view: SessionView) -> Result<Json<PanelView>, AppError> {
    view.panel.map(Json).ok_or(AppError::Session(SessionError::PanelClosed))
}

async fn open_panel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<OpenPanelRequest>,
) -> Result<Json<PanelView>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.open_panel(&request.node_id)?;
    panel_view(session.view())
}

async fn close_panel(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    let session = state.sessions.get(id).await?;
    session.lock().await.close_panel();
    Ok(StatusCode::NO_CONTENT)
}

async fn set_panel_fields(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PanelFieldsRequest>,
) -> Result<Json<PanelView>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    for (key, value) in &request.fields {
        session.set_panel_field(key, value)?;
    }
    panel_view(session.view())
}

async fn commit_panel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.commit_panel()?;
    Ok(Json(session.view()))
}

/// Validate and persist the workflow
///
/// POST /api/sessions/{id}/save
/// 422 with the validation report when invalid, 409 while another save is running
async fn save_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveResponse>, AppError> {
    let workflow = state.sessions.save(id).await?;
    let session = state.sessions.get(id).await?;
    let view = session.lock().await.view();
    Ok(Json(SaveResponse { workflow, session: view }))
}

async fn dismiss_error(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    let session = state.sessions.get(id).await?;
    session.lock().await.dismiss_error();
    Ok(StatusCode::NO_CONTENT)
}

async fn export_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowExport>, AppError> {
    let session = state.sessions.get(id).await?;
    let export = session.lock().await.store().export_workflow();
    Ok(Json(export))
}

/// Replace the session's graph with an exported workflow; history is cleared
async fn import_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(workflow): Json<WorkflowExport>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.dispatch(GraphAction::Import { workflow })?;
    Ok(Json(session.view()))
}
