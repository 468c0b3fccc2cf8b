/// Workflow API client
///
/// Persistence adapter for the external workflow service. Creates and updates go out as
/// `POST`/`PUT` against `/deployment/{deployment_id}/ai-workflows[/{workflow_id}]`; list and
/// detail reads are served from a query cache that successful mutations invalidate.
/// No retries, no idempotency keys: a failed request comes back as an [`ApiError`]
/// whose text is shown to the user as-is.

pub mod cache;
pub mod models;

use crate::config::ApiConfig;
use crate::workflow::types::WorkflowFormData;
use async_trait::async_trait;
use cache::QueryCache;
use models::{AiWorkflow, ExecuteWorkflowRequest, ListPayload, WorkflowExecution};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use models::ExecutionStatus;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Operations the studio needs from a workflow backend
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    async fn list_workflows(&self) -> Result<Vec<AiWorkflow>, ApiError>;
    async fn get_workflow(&self, workflow_id: &str) -> Result<AiWorkflow, ApiError>;
    async fn create_workflow(&self, form: &WorkflowFormData) -> Result<AiWorkflow, ApiError>;
    async fn update_workflow(&self, workflow_id: &str, form: &WorkflowFormData) -> Result<AiWorkflow, ApiError>;
    async fn delete_workflow(&self, workflow_id: &str) -> Result<(), ApiError>;
    async fn execute_workflow(&self, workflow_id: &str, input: Value) -> Result<WorkflowExecution, ApiError>;
    async fn list_executions(&self, workflow_id: &str) -> Result<Vec<WorkflowExecution>, ApiError>;
}

/// reqwest-backed [`WorkflowBackend`]
#[derive(Debug)]
pub struct WorkflowApiClient {
    http: reqwest::Client,
    base_url: String,
    deployment_id: String,
    token: Option<String>,
    cache: QueryCache,
}

impl WorkflowApiClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            deployment_id: config.deployment_id.clone(),
            token: config.token.clone(),
            cache: QueryCache::new(),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn list_key(&self) -> String {
        format!("ai-workflows:{}", self.deployment_id)
    }

    fn detail_key(&self, workflow_id: &str) -> String {
        format!("ai-workflows:{}:{}", self.deployment_id, workflow_id)
    }

    fn workflows_url(&self) -> String {
        format!("{}/deployment/{}/ai-workflows", self.base_url, self.deployment_id)
    }

    fn workflow_url(&self, workflow_id: &str) -> String {
        format!("{}/{}", self.workflows_url(), workflow_id)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        tracing::debug!("🌐 {} {}", method, url);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = check_status(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    fn invalidate_after_write(&self, workflow_id: Option<&str>) {
        let list_key = self.list_key();
        match workflow_id {
            Some(id) => {
                let detail_key = self.detail_key(id);
                self.cache.invalidate(&[&list_key, &detail_key]);
            }
            None => self.cache.invalidate(&[&list_key]),
        }
    }
}

/// Turn a non-2xx response into [`ApiError::Status`], preferring the backend's own message
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["message", "error", "detail"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    tracing::warn!("❌ Workflow API answered {}: {}", status.as_u16(), message);
    Err(ApiError::Status { status: status.as_u16(), message })
}

#[async_trait]
impl WorkflowBackend for WorkflowApiClient {
    async fn list_workflows(&self) -> Result<Vec<AiWorkflow>, ApiError> {
        let key = self.list_key();
        if let Some(cached) = self.cache.get::<Vec<AiWorkflow>>(&key) {
            return Ok(cached);
        }
        let generation = self.cache.generation();
        let payload: ListPayload<AiWorkflow> = self.send_json(self.request(Method::GET, self.workflows_url())).await?;
        let workflows = payload.into_items();
        self.cache.put_if_fresh(&key, &workflows, generation);
        Ok(workflows)
    }

    async fn get_workflow(&self, workflow_id: &str) -> Result<AiWorkflow, ApiError> {
        let key = self.detail_key(workflow_id);
        if let Some(cached) = self.cache.get::<AiWorkflow>(&key) {
            return Ok(cached);
        }
        let generation = self.cache.generation();
        let workflow: AiWorkflow = self
            .send_json(self.request(Method::GET, self.workflow_url(workflow_id)))
            .await?;
        self.cache.put_if_fresh(&key, &workflow, generation);
        Ok(workflow)
    }

    async fn create_workflow(&self, form: &WorkflowFormData) -> Result<AiWorkflow, ApiError> {
        let workflow: AiWorkflow = self
            .send_json(self.request(Method::POST, self.workflows_url()).json(form))
            .await?;
        self.invalidate_after_write(None);
        tracing::info!("🔥 Created workflow '{}' ({})", workflow.name, workflow.id);
        Ok(workflow)
    }

    async fn update_workflow(&self, workflow_id: &str, form: &WorkflowFormData) -> Result<AiWorkflow, ApiError> {
        let workflow: AiWorkflow = self
            .send_json(self.request(Method::PUT, self.workflow_url(workflow_id)).json(form))
            .await?;
        self.invalidate_after_write(Some(workflow_id));
        tracing::info!("🔥 Updated workflow '{}' ({})", workflow.name, workflow_id);
        Ok(workflow)
    }

    async fn delete_workflow(&self, workflow_id: &str) -> Result<(), ApiError> {
        check_status(self.request(Method::DELETE, self.workflow_url(workflow_id)).send().await?).await?;
        self.invalidate_after_write(Some(workflow_id));
        tracing::info!("Deleted workflow: {}", workflow_id);
        Ok(())
    }

    async fn execute_workflow(&self, workflow_id: &str, input: Value) -> Result<WorkflowExecution, ApiError> {
        let url = format!("{}/execute", self.workflow_url(workflow_id));
        let execution: WorkflowExecution = self
            .send_json(self.request(Method::POST, url).json(&ExecuteWorkflowRequest { input }))
            .await?;
        tracing::info!("🚀 Started execution {} of workflow {}", execution.id, workflow_id);
        Ok(execution)
    }

    async fn list_executions(&self, workflow_id: &str) -> Result<Vec<WorkflowExecution>, ApiError> {
        let url = format!("{}/executions", self.workflow_url(workflow_id));
        let payload: ListPayload<WorkflowExecution> = self.send_json(self.request(Method::GET, url)).await?;
        Ok(payload.into_items())
    }
}
