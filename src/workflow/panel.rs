/// Node configuration panel
///
/// Edits the data and typed configuration of one selected node. Changes are staged in a
/// local draft and only reach the store on `commit`, as a single history checkpoint;
/// dropping the panel discards them. Every field is presented as a string so form inputs
/// stay controlled regardless of the underlying type.

use crate::workflow::store::{GraphStore, NodeDataPatch, StoreError};
use crate::workflow::types::{
    ActionConfig, ActionType, ConditionConfig, ConditionOperator, NodeConfig, NodeData,
    TransformConfig, TransformType, TriggerConfig, TriggerType,
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Number,
    Toggle,
    /// JSON object entered as text
    Json,
    Select { options: Vec<&'static str> },
}

/// One control of the panel with its current display value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelField {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    #[error("node '{0}' not found")]
    NodeNotFound(String),
    #[error("field '{0}' does not apply to this node")]
    UnknownField(String),
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn invalid(key: &str, message: impl Into<String>) -> PanelError {
    PanelError::InvalidValue { key: key.to_string(), message: message.into() }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, PanelError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(key, "expected true or false")),
    }
}

fn parse_string_map(key: &str, value: &str) -> Result<BTreeMap<String, String>, PanelError> {
    if value.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(value).map_err(|e| invalid(key, format!("expected a JSON object of strings: {e}")))
}

fn map_to_string(map: &BTreeMap<String, String>) -> String {
    if map.is_empty() {
        String::new()
    } else {
        serde_json::to_string(map).unwrap_or_default()
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfigPanel {
    node_id: String,
    original_data: NodeData,
    original_config: NodeConfig,
    data: NodeData,
    config: NodeConfig,
}

impl NodeConfigPanel {
    pub fn open(store: &GraphStore, node_id: &str) -> Result<Self, PanelError> {
        let node = store
            .node(node_id)
            .ok_or_else(|| PanelError::NodeNotFound(node_id.to_string()))?;
        Ok(Self {
            node_id: node.id.clone(),
            original_data: node.data.clone(),
            original_config: node.config.clone(),
            data: node.data.clone(),
            config: node.config.clone(),
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn draft_config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.data != self.original_data || self.config != self.original_config
    }

    /// Controls for the current draft. The set depends on the node kind and on the
    /// selected trigger/action/transform sub-type.
    pub fn fields(&self) -> Vec<PanelField> {
        let mut specs: Vec<(&'static str, &'static str, FieldKind)> = vec![
            ("label", "Label", FieldKind::Text),
            ("description", "Description", FieldKind::TextArea),
            ("enabled", "Enabled", FieldKind::Toggle),
        ];

        match &self.config {
            NodeConfig::Trigger(trigger) => {
                specs.push((
                    "trigger_type",
                    "Trigger type",
                    FieldKind::Select { options: vec!["manual", "scheduled", "webhook", "event", "api_call"] },
                ));
                match trigger.trigger_type {
                    TriggerType::Scheduled => {
                        specs.push(("schedule.cron", "Cron expression", FieldKind::Text));
                        specs.push(("schedule.timezone", "Timezone", FieldKind::Text));
                    }
                    TriggerType::Webhook => {
                        specs.push(("webhook.endpoint", "Endpoint", FieldKind::Text));
                        specs.push((
                            "webhook.method",
                            "Method",
                            FieldKind::Select { options: vec!["GET", "POST", "PUT", "PATCH", "DELETE"] },
                        ));
                    }
                    TriggerType::Event => specs.push(("event.event_type", "Event type", FieldKind::Text)),
                    TriggerType::Manual | TriggerType::ApiCall => {}
                }
            }
            NodeConfig::Action(action) => {
                specs.push((
                    "action_type",
                    "Action type",
                    FieldKind::Select { options: ActionType::ALL.iter().map(|t| t.as_str()).collect() },
                ));
                match action.action_type {
                    Some(ActionType::ApiCall) => {
                        specs.push(("api.endpoint", "Endpoint", FieldKind::Text));
                        specs.push((
                            "api.method",
                            "Method",
                            FieldKind::Select { options: vec!["GET", "POST", "PUT", "PATCH", "DELETE"] },
                        ));
                        specs.push(("api.headers", "Headers", FieldKind::Json));
                        specs.push(("api.body", "Body", FieldKind::TextArea));
                    }
                    Some(ActionType::KnowledgeBaseSearch) => {
                        specs.push(("kb.knowledge_base_id", "Knowledge base", FieldKind::Text));
                        specs.push(("kb.query", "Query", FieldKind::TextArea));
                        specs.push(("kb.limit", "Result limit", FieldKind::Number));
                    }
                    Some(ActionType::TriggerWorkflow) => {
                        specs.push(("workflow.workflow_id", "Workflow", FieldKind::Text));
                        specs.push(("workflow.wait_for_completion", "Wait for completion", FieldKind::Toggle));
                    }
                    Some(ActionType::SendEmail) => {
                        specs.push(("email.to", "To", FieldKind::Text));
                        specs.push(("email.subject", "Subject", FieldKind::Text));
                        specs.push(("email.body", "Body", FieldKind::TextArea));
                    }
                    Some(ActionType::DatabaseQuery) => specs.push(("database.query", "Query", FieldKind::TextArea)),
                    Some(ActionType::StopWorkflow) | None => {}
                }
            }
            NodeConfig::Condition(_) => {
                specs.push((
                    "operator",
                    "Operator",
                    FieldKind::Select { options: ConditionOperator::ALL.iter().map(|o| o.as_str()).collect() },
                ));
                specs.push(("left_operand", "Left operand", FieldKind::Text));
                specs.push(("right_operand", "Right operand", FieldKind::Text));
                specs.push(("expression", "Expression", FieldKind::TextArea));
            }
            NodeConfig::Transform(transform) => {
                specs.push((
                    "transform_type",
                    "Transform type",
                    FieldKind::Select { options: TransformType::ALL.iter().map(|t| t.as_str()).collect() },
                ));
                match transform.transform_type {
                    TransformType::Map => specs.push(("mapping", "Field mapping", FieldKind::Json)),
                    TransformType::Filter => specs.push(("filter_expression", "Filter", FieldKind::TextArea)),
                    TransformType::Code => specs.push(("code", "Code", FieldKind::TextArea)),
                }
            }
        }

        specs
            .into_iter()
            .map(|(key, label, kind)| PanelField { key, label, kind, value: self.value(key).unwrap_or_default() })
            .collect()
    }

    /// Display value of a field, `None` if the key does not apply to this node kind
    pub fn value(&self, key: &str) -> Option<String> {
        match key {
            "label" => return Some(self.data.label.clone()),
            "description" => return Some(self.data.description.clone().unwrap_or_default()),
            "enabled" => return Some(self.data.enabled.to_string()),
            _ => {}
        }

        match &self.config {
            NodeConfig::Trigger(trigger) => trigger_value(trigger, key),
            NodeConfig::Action(action) => action_value(action, key),
            NodeConfig::Condition(condition) => condition_value(condition, key),
            NodeConfig::Transform(transform) => transform_value(transform, key),
        }
    }

    /// Stage a new value for one field
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), PanelError> {
        match key {
            "label" => self.data.label = value.to_string(),
            "description" => self.data.description = optional(value),
            "enabled" => self.data.enabled = parse_bool(key, value)?,
            _ => match &mut self.config {
                NodeConfig::Trigger(trigger) => set_trigger(trigger, key, value)?,
                NodeConfig::Action(action) => set_action(action, key, value)?,
                NodeConfig::Condition(condition) => set_condition(condition, key, value)?,
                NodeConfig::Transform(transform) => set_transform(transform, key, value)?,
            },
        }
        Ok(())
    }

    /// Drop the draft without touching the store
    pub fn discard(self) {
        if self.is_dirty() {
            tracing::debug!("🧹 Discarded staged changes for node {}", self.node_id);
        }
    }

    /// Write the staged draft to the store. A clean draft leaves the store untouched.
    pub fn commit(self, store: &mut GraphStore) -> Result<(), PanelError> {
        if !self.is_dirty() {
            return Ok(());
        }
        let patch = NodeDataPatch {
            label: Some(self.data.label),
            description: Some(self.data.description.unwrap_or_default()),
            enabled: Some(self.data.enabled),
            config: Some(self.config),
        };
        store.update_node_data(&self.node_id, patch)?;
        tracing::debug!("💾 Committed panel changes for node '{}'", self.node_id);
        Ok(())
    }
}

fn trigger_value(trigger: &TriggerConfig, key: &str) -> Option<String> {
    let schedule = trigger.schedule_config.clone().unwrap_or_default();
    let webhook = trigger.webhook_config.clone().unwrap_or_default();
    let event = trigger.event_config.clone().unwrap_or_default();
    Some(match key {
        "trigger_type" => serde_plain(&trigger.trigger_type),
        "schedule.cron" => schedule.cron,
        "schedule.timezone" => schedule.timezone,
        "webhook.endpoint" => webhook.endpoint,
        "webhook.method" => webhook.method,
        "event.event_type" => event.event_type,
        _ => return None,
    })
}

fn set_trigger(trigger: &mut TriggerConfig, key: &str, value: &str) -> Result<(), PanelError> {
    match key {
        "trigger_type" => {
            trigger.trigger_type = serde_json::from_value(serde_json::Value::String(value.to_string()))
                .map_err(|_| invalid(key, format!("unknown trigger type '{value}'")))?;
        }
        "schedule.cron" => trigger.schedule_config.get_or_insert_with(Default::default).cron = value.to_string(),
        "schedule.timezone" => {
            trigger.schedule_config.get_or_insert_with(Default::default).timezone = value.to_string()
        }
        "webhook.endpoint" => {
            trigger.webhook_config.get_or_insert_with(Default::default).endpoint = value.to_string()
        }
        "webhook.method" => trigger.webhook_config.get_or_insert_with(Default::default).method = value.to_string(),
        "event.event_type" => {
            trigger.event_config.get_or_insert_with(Default::default).event_type = value.to_string()
        }
        _ => return Err(PanelError::UnknownField(key.to_string())),
    }
    Ok(())
}

fn action_value(action: &ActionConfig, key: &str) -> Option<String> {
    let api = action.api_config.clone().unwrap_or_default();
    let kb = action.knowledge_base_config.clone().unwrap_or_default();
    let workflow = action.trigger_workflow_config.clone().unwrap_or_default();
    let email = action.email_config.clone().unwrap_or_default();
    let database = action.database_config.clone().unwrap_or_default();
    Some(match key {
        "action_type" => action.action_type.map(|t| t.as_str().to_string()).unwrap_or_default(),
        "api.endpoint" => api.endpoint,
        "api.method" => api.method,
        "api.headers" => map_to_string(&api.headers),
        "api.body" => api.body.unwrap_or_default(),
        "kb.knowledge_base_id" => kb.knowledge_base_id,
        "kb.query" => kb.query,
        "kb.limit" => kb.limit.map(|l| l.to_string()).unwrap_or_default(),
        "workflow.workflow_id" => workflow.workflow_id,
        "workflow.wait_for_completion" => workflow.wait_for_completion.to_string(),
        "email.to" => email.to,
        "email.subject" => email.subject,
        "email.body" => email.body,
        "database.query" => database.query,
        _ => return None,
    })
}

fn set_action(action: &mut ActionConfig, key: &str, value: &str) -> Result<(), PanelError> {
    match key {
        "action_type" => {
            action.action_type = if value.is_empty() {
                None
            } else {
                Some(ActionType::parse(value).ok_or_else(|| invalid(key, format!("unknown action type '{value}'")))?)
            };
        }
        "api.endpoint" => action.api_config.get_or_insert_with(Default::default).endpoint = value.to_string(),
        "api.method" => action.api_config.get_or_insert_with(Default::default).method = value.to_uppercase(),
        "api.headers" => {
            let headers = parse_string_map(key, value)?;
            action.api_config.get_or_insert_with(Default::default).headers = headers;
        }
        "api.body" => action.api_config.get_or_insert_with(Default::default).body = optional(value),
        "kb.knowledge_base_id" => {
            action.knowledge_base_config.get_or_insert_with(Default::default).knowledge_base_id = value.to_string()
        }
        "kb.query" => action.knowledge_base_config.get_or_insert_with(Default::default).query = value.to_string(),
        "kb.limit" => {
            let limit = if value.trim().is_empty() {
                None
            } else {
                Some(value.trim().parse::<u32>().map_err(|_| invalid(key, "expected a positive whole number"))?)
            };
            action.knowledge_base_config.get_or_insert_with(Default::default).limit = limit;
        }
        "workflow.workflow_id" => {
            action.trigger_workflow_config.get_or_insert_with(Default::default).workflow_id = value.to_string()
        }
        "workflow.wait_for_completion" => {
            let wait = parse_bool(key, value)?;
            action.trigger_workflow_config.get_or_insert_with(Default::default).wait_for_completion = wait;
        }
        "email.to" => action.email_config.get_or_insert_with(Default::default).to = value.to_string(),
        "email.subject" => action.email_config.get_or_insert_with(Default::default).subject = value.to_string(),
        "email.body" => action.email_config.get_or_insert_with(Default::default).body = value.to_string(),
        "database.query" => action.database_config.get_or_insert_with(Default::default).query = value.to_string(),
        _ => return Err(PanelError::UnknownField(key.to_string())),
    }
    Ok(())
}

fn condition_value(condition: &ConditionConfig, key: &str) -> Option<String> {
    Some(match key {
        "operator" => condition.operator.as_str().to_string(),
        "left_operand" => condition.left_operand.clone(),
        "right_operand" => condition.right_operand.clone(),
        "expression" => condition.expression.clone().unwrap_or_default(),
        _ => return None,
    })
}

fn set_condition(condition: &mut ConditionConfig, key: &str, value: &str) -> Result<(), PanelError> {
    match key {
        "operator" => {
            condition.operator =
                ConditionOperator::parse(value).ok_or_else(|| invalid(key, format!("unknown operator '{value}'")))?
        }
        "left_operand" => condition.left_operand = value.to_string(),
        "right_operand" => condition.right_operand = value.to_string(),
        "expression" => condition.expression = optional(value),
        _ => return Err(PanelError::UnknownField(key.to_string())),
    }
    Ok(())
}

fn transform_value(transform: &TransformConfig, key: &str) -> Option<String> {
    Some(match key {
        "transform_type" => transform.transform_type.as_str().to_string(),
        "mapping" => map_to_string(&transform.mapping),
        "filter_expression" => transform.filter_expression.clone().unwrap_or_default(),
        "code" => transform.code.clone().unwrap_or_default(),
        _ => return None,
    })
}

fn set_transform(transform: &mut TransformConfig, key: &str, value: &str) -> Result<(), PanelError> {
    match key {
        "transform_type" => {
            transform.transform_type =
                TransformType::parse(value).ok_or_else(|| invalid(key, format!("unknown transform type '{value}'")))?
        }
        "mapping" => transform.mapping = parse_string_map(key, value)?,
        "filter_expression" => transform.filter_expression = optional(value),
        "code" => transform.code = optional(value),
        _ => return Err(PanelError::UnknownField(key.to_string())),
    }
    Ok(())
}

/// Render a unit enum through its serde name
fn serde_plain<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::registry::NodeTag;
    use crate::workflow::types::Position;

    fn store_with(tag: NodeTag) -> (GraphStore, String) {
        let mut store = GraphStore::default();
        let id = store.add_node(tag, None, Position::default());
        (store, id)
    }

    fn keys(panel: &NodeConfigPanel) -> Vec<&'static str> {
        panel.fields().iter().map(|f| f.key).collect()
    }

    #[test]
    fn test_fields_follow_trigger_type() {
        let (store, id) = store_with(NodeTag::Trigger);
        let mut panel = NodeConfigPanel::open(&store, &id).unwrap();
        assert_eq!(keys(&panel), vec!["label", "description", "enabled", "trigger_type"]);

        panel.set_field("trigger_type", "scheduled").unwrap();
        assert!(keys(&panel).contains(&"schedule.cron"));

        panel.set_field("trigger_type", "webhook").unwrap();
        panel.set_field("webhook.endpoint", "/hooks/signup").unwrap();
        let fields = panel.fields();
        let endpoint = fields.iter().find(|f| f.key == "webhook.endpoint").unwrap();
        assert_eq!(endpoint.value, "/hooks/signup");
    }

    #[test]
    fn test_values_are_strings() {
        let (store, id) = store_with(NodeTag::SearchKnowledgebase);
        let panel = NodeConfigPanel::open(&store, &id).unwrap();
        assert_eq!(panel.value("enabled").as_deref(), Some("true"));
        assert_eq!(panel.value("kb.limit").as_deref(), Some("5"));
        assert_eq!(panel.value("action_type").as_deref(), Some("knowledge_base_search"));
        assert_eq!(panel.value("operator"), None);
    }

    #[test]
    fn test_edits_are_staged_until_commit() {
        let (mut store, id) = store_with(NodeTag::RestApi);
        let mut panel = NodeConfigPanel::open(&store, &id).unwrap();
        assert!(!panel.is_dirty());

        panel.set_field("label", "Create ticket").unwrap();
        panel.set_field("api.endpoint", "https://helpdesk.example.com/tickets").unwrap();
        panel.set_field("api.method", "post").unwrap();
        panel.set_field("api.headers", r#"{"Authorization": "Bearer x"}"#).unwrap();
        assert!(panel.is_dirty());
        assert_eq!(store.node(&id).unwrap().data.label, "REST API");

        let past = store.history().past_len();
        panel.commit(&mut store).unwrap();
        assert_eq!(store.history().past_len(), past + 1);

        let node = store.node(&id).unwrap();
        assert_eq!(node.data.label, "Create ticket");
        let NodeConfig::Action(action) = &node.config else { panic!("expected action") };
        let api = action.api_config.as_ref().unwrap();
        assert_eq!(api.method, "POST");
        assert_eq!(api.headers["Authorization"], "Bearer x");
    }

    #[test]
    fn test_discard_leaves_store_untouched() {
        let (mut store, id) = store_with(NodeTag::Condition);
        let before = store.snapshot();
        let mut panel = NodeConfigPanel::open(&store, &id).unwrap();
        panel.set_field("operator", "greater_than").unwrap();
        panel.set_field("left_operand", "{{score}}").unwrap();
        drop(panel);
        assert_eq!(store.snapshot(), before);

        // clean commit is a no-op
        let past = store.history().past_len();
        NodeConfigPanel::open(&store, &id).unwrap().commit(&mut store).unwrap();
        assert_eq!(store.history().past_len(), past);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let (store, id) = store_with(NodeTag::Transform);
        let mut panel = NodeConfigPanel::open(&store, &id).unwrap();

        assert!(matches!(panel.set_field("enabled", "maybe"), Err(PanelError::InvalidValue { .. })));
        assert!(matches!(panel.set_field("mapping", "[1]"), Err(PanelError::InvalidValue { .. })));
        assert_eq!(panel.set_field("api.endpoint", "x"), Err(PanelError::UnknownField("api.endpoint".to_string())));
        assert!(!panel.is_dirty());

        panel.set_field("transform_type", "code").unwrap();
        panel.set_field("code", "return input;").unwrap();
        assert_eq!(keys(&panel).last(), Some(&"code"));
    }

    #[test]
    fn test_action_subforms() {
        let (store, id) = store_with(NodeTag::Action);
        let mut panel = NodeConfigPanel::open(&store, &id).unwrap();
        assert_eq!(keys(&panel).last(), Some(&"action_type"));

        panel.set_field("action_type", "send_email").unwrap();
        panel.set_field("email.to", "ops@example.com").unwrap();
        assert!(keys(&panel).contains(&"email.subject"));

        panel.set_field("action_type", "database_query").unwrap();
        assert_eq!(keys(&panel).last(), Some(&"database.query"));

        assert!(panel.set_field("action_type", "teleport").is_err());
    }

    #[test]
    fn test_open_unknown_node() {
        let store = GraphStore::default();
        assert_eq!(
            NodeConfigPanel::open(&store, "ghost").unwrap_err(),
            PanelError::NodeNotFound("ghost".to_string())
        );
    }
}
