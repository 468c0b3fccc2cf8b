/// Payload shapes of the external workflow API
///
/// Only the fields the studio reads are modelled; everything else the backend sends is
/// ignored on deserialization.

use crate::workflow::types::{WorkflowConfiguration, WorkflowDefinition, WorkflowFormData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored workflow as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiWorkflow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub configuration: WorkflowConfiguration,
    #[serde(default)]
    pub workflow_definition: WorkflowDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AiWorkflow {
    /// Editable form payload for this workflow
    pub fn to_form_data(&self) -> WorkflowFormData {
        WorkflowFormData {
            name: self.name.clone(),
            description: self.description.clone(),
            configuration: self.configuration.clone(),
            workflow_definition: self.workflow_definition.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// One run of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub id: String,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Request body of `POST .../execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteWorkflowRequest {
    #[serde(default)]
    pub input: Value,
}

/// List endpoints answer either with a bare array or with a `{data: [...]}` envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListPayload<T> {
    Bare(Vec<T>),
    Envelope {
        #[serde(alias = "workflows", alias = "executions")]
        data: Vec<T>,
    },
}

impl<T> ListPayload<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            ListPayload::Bare(items) | ListPayload::Envelope { data: items } => items,
        }
    }
}
