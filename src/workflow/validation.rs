/// Workflow validation
///
/// Pure checks over a [`WorkflowFormData`] that produce field-level errors with dotted,
/// indexed paths (`workflow_definition.nodes[2].config.api_config.endpoint`) so the editor
/// can map each one back to a form control. Every group of checks runs and errors
/// accumulate; only the node/edge structural pass stops early on an empty graph.
///
/// Warnings never make a workflow invalid.

use crate::workflow::graph::WorkflowGraph;
use crate::workflow::types::{
    ActionType, NodeConfig, TriggerType, VariableType, WorkflowConfiguration, WorkflowFormData,
    WorkflowNode,
};
use serde::Serialize;
use std::collections::HashSet;
use std::ops::RangeInclusive;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const TIMEOUT_RANGE: RangeInclusive<i64> = 1..=3600;
pub const RETRY_RANGE: RangeInclusive<i64> = 0..=10;
pub const RETRY_DELAY_RANGE: RangeInclusive<i64> = 1..=300;

const NODES: &str = "workflow_definition.nodes";
const EDGES: &str = "workflow_definition.edges";

/// One failed check, addressed by form field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
    pub warnings: Vec<FieldError>,
}

impl ValidationReport {
    /// Errors reported for exactly this field path
    pub fn errors_for(&self, field: &str) -> Vec<&FieldError> {
        self.errors.iter().filter(|e| e.field == field).collect()
    }

    pub fn has_error(&self, field: &str, message: &str) -> bool {
        self.errors.iter().any(|e| e.field == field && e.message == message)
    }
}

pub fn validate_workflow(form: &WorkflowFormData) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    validate_name(&form.name, &mut errors);
    validate_description(form.description.as_deref(), &mut errors);
    validate_configuration(&form.configuration, &mut errors);

    let nodes = &form.workflow_definition.nodes;
    let edges_ok = validate_structure(form, &mut errors);
    for (index, node) in nodes.iter().enumerate() {
        validate_node_config(index, node, &mut errors);
    }
    if edges_ok {
        collect_warnings(form, &mut warnings);
    }

    if !errors.is_empty() {
        tracing::debug!("🔍 Workflow '{}' failed validation with {} errors", form.name, errors.len());
    }

    ValidationReport { is_valid: errors.is_empty(), errors, warnings }
}

fn validate_name(name: &str, errors: &mut Vec<FieldError>) {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new("name", "Workflow name is required"));
    } else if trimmed.chars().count() > MAX_NAME_LENGTH {
        errors.push(FieldError::new(
            "name",
            format!("Workflow name must be {MAX_NAME_LENGTH} characters or less"),
        ));
    }
}

fn validate_description(description: Option<&str>, errors: &mut Vec<FieldError>) {
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            errors.push(FieldError::new(
                "description",
                format!("Description must be {MAX_DESCRIPTION_LENGTH} characters or less"),
            ));
        }
    }
}

fn check_range(
    value: i64,
    range: &RangeInclusive<i64>,
    field: &str,
    too_low: String,
    too_high: String,
    errors: &mut Vec<FieldError>,
) {
    if value < *range.start() {
        errors.push(FieldError::new(field, too_low));
    } else if value > *range.end() {
        errors.push(FieldError::new(field, too_high));
    }
}

fn validate_configuration(config: &WorkflowConfiguration, errors: &mut Vec<FieldError>) {
    check_range(
        config.timeout_seconds,
        &TIMEOUT_RANGE,
        "configuration.timeout_seconds",
        format!("Timeout must be at least {} second", TIMEOUT_RANGE.start()),
        format!("Timeout cannot exceed {} seconds", TIMEOUT_RANGE.end()),
        errors,
    );
    check_range(
        config.max_retries,
        &RETRY_RANGE,
        "configuration.max_retries",
        "Max retries cannot be negative".to_string(),
        format!("Max retries cannot exceed {}", RETRY_RANGE.end()),
        errors,
    );
    check_range(
        config.retry_delay_seconds,
        &RETRY_DELAY_RANGE,
        "configuration.retry_delay_seconds",
        format!("Retry delay must be at least {} second", RETRY_DELAY_RANGE.start()),
        format!("Retry delay cannot exceed {} seconds", RETRY_DELAY_RANGE.end()),
        errors,
    );

    for (key, variable) in &config.variables {
        let prefix = format!("configuration.variables.{key}");

        if variable.name.trim().is_empty() {
            errors.push(FieldError::new(format!("{prefix}.name"), "Variable name is required"));
        }

        let Some(value_type) = variable.parsed_type() else {
            errors.push(FieldError::new(
                format!("{prefix}.value_type"),
                format!("Invalid variable type '{}'", variable.value_type),
            ));
            continue;
        };

        if let Some(default) = &variable.default_value {
            if !default_matches_type(default, value_type) {
                errors.push(FieldError::new(
                    format!("{prefix}.default_value"),
                    format!("Default value must be a valid {}", variable.value_type),
                ));
            }
        }
    }
}

/// Whether a form-entered default value coerces to the declared type
pub fn default_matches_type(value: &str, value_type: VariableType) -> bool {
    match value_type {
        VariableType::String => true,
        VariableType::Number => value.trim().parse::<f64>().map(|n| n.is_finite()).unwrap_or(false),
        VariableType::Boolean => value == "true" || value == "false",
        VariableType::Object => serde_json::from_str::<serde_json::Value>(value)
            .map(|v| v.is_object())
            .unwrap_or(false),
        VariableType::Array => serde_json::from_str::<serde_json::Value>(value)
            .map(|v| v.is_array())
            .unwrap_or(false),
    }
}

/// Node/edge structural checks. Returns false when the graph is empty and the pass stopped early.
fn validate_structure(form: &WorkflowFormData, errors: &mut Vec<FieldError>) -> bool {
    let nodes = &form.workflow_definition.nodes;
    let edges = &form.workflow_definition.edges;

    if nodes.is_empty() {
        errors.push(FieldError::new(NODES, "Workflow must have at least one node"));
        return false;
    }

    let trigger_count = nodes.iter().filter(|n| n.is_trigger()).count();
    if trigger_count == 0 {
        errors.push(FieldError::new(NODES, "Workflow must have a trigger node"));
    } else if trigger_count > 1 {
        errors.push(FieldError::new(NODES, "Workflow can only have one trigger node"));
    }

    let mut seen_ids = HashSet::new();
    for (index, node) in nodes.iter().enumerate() {
        let prefix = format!("{NODES}[{index}]");
        if node.id.trim().is_empty() {
            errors.push(FieldError::new(format!("{prefix}.id"), "Node ID is required"));
        } else if !seen_ids.insert(node.id.as_str()) {
            errors.push(FieldError::new(format!("{prefix}.id"), format!("Node ID '{}' must be unique", node.id)));
        }
        if node.data.label.trim().is_empty() {
            errors.push(FieldError::new(format!("{prefix}.data.label"), "Node label is required"));
        }
        if !node.position.is_finite() {
            errors.push(FieldError::new(format!("{prefix}.position"), "Node position must be finite numbers"));
        }
    }

    let find = |id: &str| nodes.iter().find(|n| n.id == id);
    for (index, edge) in edges.iter().enumerate() {
        let prefix = format!("{EDGES}[{index}]");
        match find(&edge.source) {
            None => errors.push(FieldError::new(
                format!("{prefix}.source"),
                format!("Source node '{}' does not exist", edge.source),
            )),
            Some(source) if source.is_terminal() => errors.push(FieldError::new(
                format!("{prefix}.source"),
                "Stop-workflow nodes cannot have outgoing connections",
            )),
            Some(_) => {}
        }
        match find(&edge.target) {
            None => errors.push(FieldError::new(
                format!("{prefix}.target"),
                format!("Target node '{}' does not exist", edge.target),
            )),
            Some(target) if target.is_trigger() => errors.push(FieldError::new(
                format!("{prefix}.target"),
                "Trigger nodes cannot have incoming connections",
            )),
            Some(_) => {}
        }
        if edge.source == edge.target {
            errors.push(FieldError::new(prefix, "Edge cannot connect a node to itself"));
        }
    }

    let connected: HashSet<&str> = edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();
    for (index, node) in nodes.iter().enumerate() {
        if !node.is_trigger() && !connected.contains(node.id.as_str()) {
            errors.push(FieldError::new(
                format!("{NODES}[{index}]"),
                format!("Node '{}' is not connected to the workflow", node.data.label),
            ));
        }
    }

    true
}

fn required(value: &str, field: String, message: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, message));
    }
}

fn validate_node_config(index: usize, node: &WorkflowNode, errors: &mut Vec<FieldError>) {
    let prefix = format!("{NODES}[{index}].config");

    match &node.config {
        NodeConfig::Trigger(trigger) => {
            if trigger.trigger_type == TriggerType::Webhook || trigger.webhook_config.is_some() {
                let endpoint = trigger.webhook_config.as_ref().map_or("", |w| w.endpoint.as_str());
                required(endpoint, format!("{prefix}.webhook_config.endpoint"), "Webhook endpoint is required", errors);
            }
        }
        NodeConfig::Action(action) => match action.action_type {
            None => errors.push(FieldError::new(format!("{prefix}.action_type"), "Action type is required")),
            Some(ActionType::ApiCall) => {
                let (endpoint, method) = action
                    .api_config
                    .as_ref()
                    .map_or(("", ""), |api| (api.endpoint.as_str(), api.method.as_str()));
                required(endpoint, format!("{prefix}.api_config.endpoint"), "API endpoint is required", errors);
                required(method, format!("{prefix}.api_config.method"), "HTTP method is required", errors);
            }
            Some(ActionType::KnowledgeBaseSearch) => {
                let (kb, query) = action
                    .knowledge_base_config
                    .as_ref()
                    .map_or(("", ""), |kb| (kb.knowledge_base_id.as_str(), kb.query.as_str()));
                required(
                    kb,
                    format!("{prefix}.knowledge_base_config.knowledge_base_id"),
                    "Knowledge base is required",
                    errors,
                );
                required(query, format!("{prefix}.knowledge_base_config.query"), "Search query is required", errors);
            }
            Some(_) => {}
        },
        NodeConfig::Condition(_) | NodeConfig::Transform(_) => {}
    }
}

fn collect_warnings(form: &WorkflowFormData, warnings: &mut Vec<FieldError>) {
    let nodes = &form.workflow_definition.nodes;
    let edges = &form.workflow_definition.edges;
    let graph = WorkflowGraph::build(nodes, edges);

    if graph.has_cycle() {
        warnings.push(FieldError::new(EDGES, "Workflow contains a cycle"));
    }

    let mut triggers = nodes.iter().filter(|n| n.is_trigger());
    let (Some(trigger), None) = (triggers.next(), triggers.next()) else {
        return;
    };

    let reachable = graph.reachable_from(&trigger.id);
    let connected: HashSet<&str> = edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();
    for (index, node) in nodes.iter().enumerate() {
        if connected.contains(node.id.as_str()) && !reachable.contains(node.id.as_str()) {
            warnings.push(FieldError::new(
                format!("{NODES}[{index}]"),
                format!("Node '{}' is not reachable from the trigger", node.data.label),
            ));
        }
    }
}
