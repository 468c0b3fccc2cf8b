//! Workflow API client against a throwaway axum server standing in for the backend.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tokio::net::TcpListener;
use workflow_studio::{
    client::{ApiError, ExecutionStatus, WorkflowApiClient, WorkflowBackend},
    config::ApiConfig,
    workflow::types::WorkflowFormData,
};

#[derive(Default)]
struct FakeApi {
    list_hits: AtomicUsize,
    detail_hits: AtomicUsize,
    last_auth: Mutex<Option<String>>,
    workflows: Mutex<HashMap<String, Value>>,
}

type Shared = Arc<FakeApi>;

fn record_auth(api: &FakeApi, headers: &HeaderMap) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *api.last_auth.lock().unwrap() = auth;
}

fn missing(id: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"message": format!("Workflow {id} not found")}))).into_response()
}

async fn list(State(api): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record_auth(&api, &headers);
    api.list_hits.fetch_add(1, Ordering::SeqCst);
    let workflows: Vec<Value> = api.workflows.lock().unwrap().values().cloned().collect();
    Json(json!({"data": workflows, "total": workflows.len()}))
}

async fn create(
    State(api): State<Shared>,
    Path(deployment): Path<String>,
    Json(mut form): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut workflows = api.workflows.lock().unwrap();
    let id = format!("wf_{}", workflows.len() + 1);
    form["id"] = json!(id);
    form["deployment_id"] = json!(deployment);
    form["created_at"] = json!("2024-05-01T10:00:00Z");
    workflows.insert(id, form.clone());
    (StatusCode::CREATED, Json(form))
}

async fn detail(State(api): State<Shared>, Path((_, id)): Path<(String, String)>) -> Response {
    api.detail_hits.fetch_add(1, Ordering::SeqCst);
    if id == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "database unavailable"}))).into_response();
    }
    match api.workflows.lock().unwrap().get(&id) {
        Some(workflow) => Json(workflow.clone()).into_response(),
        None => missing(&id),
    }
}

async fn update(
    State(api): State<Shared>,
    Path((_, id)): Path<(String, String)>,
    Json(mut form): Json<Value>,
) -> Response {
    let mut workflows = api.workflows.lock().unwrap();
    if !workflows.contains_key(&id) {
        return missing(&id);
    }
    form["id"] = json!(id);
    workflows.insert(id, form.clone());
    Json(form).into_response()
}

async fn remove(State(api): State<Shared>, Path((_, id)): Path<(String, String)>) -> Response {
    match api.workflows.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => missing(&id),
    }
}

async fn execute(Path((_, id)): Path<(String, String)>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "id": "exec_1",
        "workflow_id": id,
        "status": "running",
        "input": body["input"],
    }))
}

async fn executions(Path((_, id)): Path<(String, String)>) -> Json<Value> {
    Json(json!([
        {"id": "exec_1", "workflow_id": id, "status": "completed", "output": {"ok": true}},
        {"id": "exec_2", "workflow_id": id, "status": "failed", "error": "timeout"}
    ]))
}

async fn spawn_fake_api() -> (Shared, WorkflowApiClient) {
    let api: Shared = Arc::new(FakeApi::default());
    let app = Router::new()
        .route("/deployment/{deployment}/ai-workflows", get(list).post(create))
        .route("/deployment/{deployment}/ai-workflows/{id}", get(detail).put(update).delete(remove))
        .route("/deployment/{deployment}/ai-workflows/{id}/execute", post(execute))
        .route("/deployment/{deployment}/ai-workflows/{id}/executions", get(executions))
        .with_state(api.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = WorkflowApiClient::new(&ApiConfig {
        base_url: format!("http://{addr}/"),
        deployment_id: "dep_1".to_string(),
        token: Some("secret-token".to_string()),
    });
    (api, client)
}

fn form(name: &str) -> WorkflowFormData {
    WorkflowFormData { name: name.to_string(), ..Default::default() }
}

#[tokio::test]
async fn test_list_is_cached_until_create() {
    let (api, client) = spawn_fake_api().await;

    assert!(client.list_workflows().await.unwrap().is_empty());
    assert!(client.list_workflows().await.unwrap().is_empty());
    assert_eq!(api.list_hits.load(Ordering::SeqCst), 1);
    assert_eq!(api.last_auth.lock().unwrap().as_deref(), Some("Bearer secret-token"));

    let created = client.create_workflow(&form("Invoice reminder")).await.unwrap();
    assert_eq!(created.id, "wf_1");
    assert_eq!(created.deployment_id.as_deref(), Some("dep_1"));
    assert!(created.created_at.is_some());
    assert!(!client.cache().contains("ai-workflows:dep_1"));

    let listed = client.list_workflows().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Invoice reminder");
    assert_eq!(api.list_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_update_and_delete_invalidate_detail() {
    let (api, client) = spawn_fake_api().await;
    let created = client.create_workflow(&form("Draft")).await.unwrap();

    client.get_workflow(&created.id).await.unwrap();
    client.get_workflow(&created.id).await.unwrap();
    assert_eq!(api.detail_hits.load(Ordering::SeqCst), 1);

    client.list_workflows().await.unwrap();
    let updated = client.update_workflow(&created.id, &form("Final")).await.unwrap();
    assert_eq!(updated.name, "Final");
    assert!(!client.cache().contains("ai-workflows:dep_1"));

    let fetched = client.get_workflow(&created.id).await.unwrap();
    assert_eq!(fetched.name, "Final");
    assert_eq!(api.detail_hits.load(Ordering::SeqCst), 2);

    client.delete_workflow(&created.id).await.unwrap();
    assert!(client.cache().is_empty());
    let err = client.get_workflow(&created.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_error_message_comes_from_body() {
    let (_, client) = spawn_fake_api().await;

    match client.get_workflow("broken").await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let err = client.update_workflow("wf_missing", &form("x")).await.unwrap_err();
    assert_eq!(err.to_string(), "Workflow wf_missing not found (HTTP 404)");
}

#[tokio::test]
async fn test_execute_and_list_executions() {
    let (_, client) = spawn_fake_api().await;

    let execution = client.execute_workflow("wf_7", json!({"customer": "c_1"})).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Running);
    assert_eq!(execution.input, Some(json!({"customer": "c_1"})));

    let runs = client.list_executions("wf_7").await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1].error.as_deref(), Some("timeout"));
}
