/// Core workflow type definitions
///
/// Defines nodes, edges, workflow-level configuration and the form payload that is
/// exchanged with the workflow API. Per-type node configuration is a tagged union,
/// so every consumer matches on the node kind instead of poking at a JSON bag.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Version string stamped on every workflow definition we produce
pub const DEFINITION_VERSION: &str = "1.0";

fn default_enabled() -> bool {
    true
}

fn default_version() -> String {
    DEFINITION_VERSION.to_string()
}

/// Canvas coordinates of a node. Purely presentational.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Presentation data shared by every node kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Label rendered on the canvas
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Disabled nodes stay in the graph but are skipped by the backend
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl NodeData {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), description: None, enabled: true }
    }
}

/// Discriminant of [`NodeConfig`], handy for rules that only care about the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Trigger,
    Action,
    Condition,
    Transform,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Action => "action",
            NodeKind::Condition => "condition",
            NodeKind::Transform => "transform",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed per-kind configuration. Serialized as `"type": "...", "config": {...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum NodeConfig {
    Trigger(TriggerConfig),
    Action(ActionConfig),
    Condition(ConditionConfig),
    Transform(TransformConfig),
}

impl NodeConfig {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Trigger(_) => NodeKind::Trigger,
            NodeConfig::Action(_) => NodeKind::Action,
            NodeConfig::Condition(_) => NodeKind::Condition,
            NodeConfig::Transform(_) => NodeKind::Transform,
        }
    }
}

/// How a workflow gets started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    #[default]
    Manual,
    Scheduled,
    Webhook,
    Event,
    ApiCall,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Cron expression, e.g. "0 */5 * * * *"
    pub cron: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub endpoint: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub event_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub trigger_type: TriggerType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_config: Option<ScheduleConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_config: Option<WebhookConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_config: Option<EventConfig>,
}

/// What an action node does when reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ApiCall,
    KnowledgeBaseSearch,
    TriggerWorkflow,
    SendEmail,
    DatabaseQuery,
    /// Terminal action: ends the run and has no outputs
    StopWorkflow,
}

impl ActionType {
    pub const ALL: [ActionType; 6] = [
        ActionType::ApiCall,
        ActionType::KnowledgeBaseSearch,
        ActionType::TriggerWorkflow,
        ActionType::SendEmail,
        ActionType::DatabaseQuery,
        ActionType::StopWorkflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::ApiCall => "api_call",
            ActionType::KnowledgeBaseSearch => "knowledge_base_search",
            ActionType::TriggerWorkflow => "trigger_workflow",
            ActionType::SendEmail => "send_email",
            ActionType::DatabaseQuery => "database_query",
            ActionType::StopWorkflow => "stop_workflow",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiCallConfig {
    pub endpoint: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    pub knowledge_base_id: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerWorkflowConfig {
    pub workflow_id: String,
    pub wait_for_completion: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub query: String,
}

/// Action configuration. `action_type` stays optional so that an unfinished
/// node can be represented and reported by the validator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    pub action_type: Option<ActionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_config: Option<ApiCallConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base_config: Option<KnowledgeBaseConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_workflow_config: Option<TriggerWorkflowConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_config: Option<EmailConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_config: Option<DatabaseConfig>,
}

impl ActionConfig {
    pub fn of_type(action_type: ActionType) -> Self {
        Self { action_type: Some(action_type), ..Default::default() }
    }

    pub fn is_terminal(&self) -> bool {
        self.action_type == Some(ActionType::StopWorkflow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    #[default]
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    IsEmpty,
}

impl ConditionOperator {
    pub const ALL: [ConditionOperator; 6] = [
        ConditionOperator::Equals,
        ConditionOperator::NotEquals,
        ConditionOperator::GreaterThan,
        ConditionOperator::LessThan,
        ConditionOperator::Contains,
        ConditionOperator::IsEmpty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
            ConditionOperator::Contains => "contains",
            ConditionOperator::IsEmpty => "is_empty",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionConfig {
    pub operator: ConditionOperator,
    pub left_operand: String,
    pub right_operand: String,
    /// Free-form expression; takes precedence over operator/operands when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformType {
    #[default]
    Map,
    Filter,
    Code,
}

impl TransformType {
    pub const ALL: [TransformType; 3] = [TransformType::Map, TransformType::Filter, TransformType::Code];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformType::Map => "map",
            TransformType::Filter => "filter",
            TransformType::Code => "code",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub transform_type: TransformType,
    /// Output field name -> expression
    pub mapping: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A single node on the workflow canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique within a workflow (e.g. "action-3")
    pub id: String,
    #[serde(flatten)]
    pub config: NodeConfig,
    pub position: Position,
    pub data: NodeData,
}

impl WorkflowNode {
    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self.config, NodeConfig::Trigger(_))
    }

    pub fn is_condition(&self) -> bool {
        matches!(self.config, NodeConfig::Condition(_))
    }

    /// Stop-workflow actions end the run and accept no outgoing edges
    pub fn is_terminal(&self) -> bool {
        matches!(&self.config, NodeConfig::Action(action) if action.is_terminal())
    }
}

/// Stroke used to tell condition branches apart on the canvas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub stroke: String,
}

/// Directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, alias = "sourceHandle", skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, alias = "targetHandle", skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
}

/// A proposed edge, as produced by dragging from one handle to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
    #[serde(default, alias = "sourceHandle")]
    pub source_handle: Option<String>,
    #[serde(default, alias = "targetHandle")]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self { source: source.into(), target: target.into(), source_handle: None, target_handle: None }
    }

    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }
}

/// Declared type of a workflow variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl VariableType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(VariableType::String),
            "number" => Some(VariableType::Number),
            "boolean" => Some(VariableType::Boolean),
            "object" => Some(VariableType::Object),
            "array" => Some(VariableType::Array),
            _ => None,
        }
    }
}

/// Workflow input variable. `value_type` is kept as the raw form string so that
/// an unknown type can be reported instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowVariable {
    pub name: String,
    pub value_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub required: bool,
}

impl WorkflowVariable {
    pub fn parsed_type(&self) -> Option<VariableType> {
        VariableType::parse(&self.value_type)
    }
}

/// Workflow-level execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfiguration {
    pub timeout_seconds: i64,
    pub max_retries: i64,
    pub retry_delay_seconds: i64,
    pub variables: BTreeMap<String, WorkflowVariable>,
}

impl Default for WorkflowConfiguration {
    fn default() -> Self {
        Self {
            timeout_seconds: 300,
            max_retries: 3,
            retry_delay_seconds: 5,
            variables: BTreeMap::new(),
        }
    }
}

/// Serializable graph payload sent to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for WorkflowDefinition {
    fn default() -> Self {
        Self { nodes: Vec::new(), edges: Vec::new(), version: default_version() }
    }
}

/// The unit submitted to and loaded from the workflow API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowFormData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub configuration: WorkflowConfiguration,
    #[serde(default)]
    pub workflow_definition: WorkflowDefinition,
}

/// Portable snapshot produced by export and consumed by import
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowExport {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}
