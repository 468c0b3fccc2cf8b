/// Node palette registry
///
/// Maps the tags the builder palette exposes (`trigger`, `rest-api`, `stop-workflow`, ...)
/// to a renderable shape and the default configuration a freshly dropped node starts with.
/// Specialized tags are presets over the four base node kinds, so the tag of an existing
/// node can always be recovered from its configuration.

use crate::workflow::types::{
    ActionConfig, ActionType, ApiCallConfig, ConditionConfig, KnowledgeBaseConfig, NodeConfig,
    NodeData, NodeKind, TransformConfig, TriggerConfig,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output handle ids of a condition node
pub const TRUE_HANDLE: &str = "true";
pub const FALSE_HANDLE: &str = "false";

/// Palette entry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeTag {
    Trigger,
    Action,
    Condition,
    Transform,
    RestApi,
    SearchKnowledgebase,
    StopWorkflow,
    Conditional,
}

impl NodeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeTag::Trigger => "trigger",
            NodeTag::Action => "action",
            NodeTag::Condition => "condition",
            NodeTag::Transform => "transform",
            NodeTag::RestApi => "rest-api",
            NodeTag::SearchKnowledgebase => "search-knowledgebase",
            NodeTag::StopWorkflow => "stop-workflow",
            NodeTag::Conditional => "conditional",
        }
    }

    /// Base node kind the tag expands to
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeTag::Trigger => NodeKind::Trigger,
            NodeTag::Action | NodeTag::RestApi | NodeTag::SearchKnowledgebase | NodeTag::StopWorkflow => {
                NodeKind::Action
            }
            NodeTag::Condition | NodeTag::Conditional => NodeKind::Condition,
            NodeTag::Transform => NodeKind::Transform,
        }
    }

    /// Tag a configuration renders as
    pub fn of_config(config: &NodeConfig) -> NodeTag {
        match config {
            NodeConfig::Trigger(_) => NodeTag::Trigger,
            NodeConfig::Action(action) => match action.action_type {
                Some(ActionType::ApiCall) => NodeTag::RestApi,
                Some(ActionType::KnowledgeBaseSearch) => NodeTag::SearchKnowledgebase,
                Some(ActionType::StopWorkflow) => NodeTag::StopWorkflow,
                _ => NodeTag::Action,
            },
            NodeConfig::Condition(condition) if condition.expression.is_some() => NodeTag::Conditional,
            NodeConfig::Condition(_) => NodeTag::Condition,
            NodeConfig::Transform(_) => NodeTag::Transform,
        }
    }

    /// Ports of nodes with this tag
    pub fn shape(&self) -> NodeShape {
        match self {
            NodeTag::Trigger => NodeShape { accepts_input: false, outputs: OutputPorts::Single },
            NodeTag::StopWorkflow => NodeShape { accepts_input: true, outputs: OutputPorts::None },
            NodeTag::Condition | NodeTag::Conditional => NodeShape { accepts_input: true, outputs: OutputPorts::Branch },
            NodeTag::Action | NodeTag::RestApi | NodeTag::SearchKnowledgebase | NodeTag::Transform => {
                NodeShape { accepts_input: true, outputs: OutputPorts::Single }
            }
        }
    }
}

impl NodeShape {
    pub fn of(config: &NodeConfig) -> NodeShape {
        NodeTag::of_config(config).shape()
    }

    /// Whether at least one edge may leave the node
    pub fn has_outputs(&self) -> bool {
        !self.output_handles().is_empty()
    }
}

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which output ports a node exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputPorts {
    /// Terminal node, nothing can leave it
    None,
    /// One unnamed output
    Single,
    /// Named "true"/"false" outputs
    Branch,
}

/// Renderable shape of a palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeShape {
    /// Whether the node has an input port (triggers are graph roots)
    pub accepts_input: bool,
    pub outputs: OutputPorts,
}

impl NodeShape {
    /// Handle ids a connection may start from; `None` means the unnamed output
    pub fn output_handles(&self) -> Vec<Option<&'static str>> {
        match self.outputs {
            OutputPorts::None => Vec::new(),
            OutputPorts::Single => vec![None],
            OutputPorts::Branch => vec![Some(TRUE_HANDLE), Some(FALSE_HANDLE)],
        }
    }
}

/// A palette entry
#[derive(Debug, Clone, Serialize)]
pub struct NodeTemplate {
    pub tag: NodeTag,
    pub kind: NodeKind,
    /// Default label given to dropped nodes
    pub label: &'static str,
    pub description: &'static str,
    pub shape: NodeShape,
}

impl NodeTemplate {
    /// Configuration a freshly dropped node of this tag starts with
    pub fn default_config(&self) -> NodeConfig {
        match self.tag {
            NodeTag::Trigger => NodeConfig::Trigger(TriggerConfig::default()),
            NodeTag::Action => NodeConfig::Action(ActionConfig::default()),
            NodeTag::RestApi => NodeConfig::Action(ActionConfig {
                api_config: Some(ApiCallConfig { method: "GET".to_string(), ..Default::default() }),
                ..ActionConfig::of_type(ActionType::ApiCall)
            }),
            NodeTag::SearchKnowledgebase => NodeConfig::Action(ActionConfig {
                knowledge_base_config: Some(KnowledgeBaseConfig { limit: Some(5), ..Default::default() }),
                ..ActionConfig::of_type(ActionType::KnowledgeBaseSearch)
            }),
            NodeTag::StopWorkflow => NodeConfig::Action(ActionConfig::of_type(ActionType::StopWorkflow)),
            NodeTag::Condition => NodeConfig::Condition(ConditionConfig::default()),
            NodeTag::Conditional => NodeConfig::Condition(ConditionConfig {
                expression: Some(String::new()),
                ..Default::default()
            }),
            NodeTag::Transform => NodeConfig::Transform(TransformConfig::default()),
        }
    }

    pub fn default_data(&self) -> NodeData {
        NodeData::new(self.label)
    }
}

/// Registry of every node tag the builder knows how to create
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    templates: Vec<NodeTemplate>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        let templates = vec![
            NodeTemplate {
                tag: NodeTag::Trigger,
                kind: NodeKind::Trigger,
                label: "Trigger",
                description: "Starts the workflow manually, on a schedule, from a webhook or an event",
                shape: NodeTag::Trigger.shape(),
            },
            NodeTemplate {
                tag: NodeTag::Action,
                kind: NodeKind::Action,
                label: "Action",
                description: "Performs a step with an external effect",
                shape: NodeTag::Action.shape(),
            },
            NodeTemplate {
                tag: NodeTag::RestApi,
                kind: NodeKind::Action,
                label: "REST API",
                description: "Calls an HTTP endpoint",
                shape: NodeTag::RestApi.shape(),
            },
            NodeTemplate {
                tag: NodeTag::SearchKnowledgebase,
                kind: NodeKind::Action,
                label: "Search Knowledge Base",
                description: "Queries a knowledge base",
                shape: NodeTag::SearchKnowledgebase.shape(),
            },
            NodeTemplate {
                tag: NodeTag::StopWorkflow,
                kind: NodeKind::Action,
                label: "Stop Workflow",
                description: "Ends the run",
                shape: NodeTag::StopWorkflow.shape(),
            },
            NodeTemplate {
                tag: NodeTag::Condition,
                kind: NodeKind::Condition,
                label: "Condition",
                description: "Branches on a comparison",
                shape: NodeTag::Condition.shape(),
            },
            NodeTemplate {
                tag: NodeTag::Conditional,
                kind: NodeKind::Condition,
                label: "Conditional",
                description: "Branches on a free-form expression",
                shape: NodeTag::Conditional.shape(),
            },
            NodeTemplate {
                tag: NodeTag::Transform,
                kind: NodeKind::Transform,
                label: "Transform",
                description: "Maps, filters or reshapes data with code",
                shape: NodeTag::Transform.shape(),
            },
        ];

        Self { templates }
    }

    pub fn templates(&self) -> &[NodeTemplate] {
        &self.templates
    }

    pub fn template(&self, tag: NodeTag) -> &NodeTemplate {
        self.templates
            .iter()
            .find(|t| t.tag == tag)
            .unwrap_or(&self.templates[0])
    }

    /// Ports of the palette entry a configuration renders as
    pub fn shape_of(&self, config: &NodeConfig) -> NodeShape {
        self.template(NodeTag::of_config(config)).shape
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{Position, WorkflowNode};

    fn node_from(registry: &NodeRegistry, tag: NodeTag) -> WorkflowNode {
        let template = registry.template(tag);
        WorkflowNode {
            id: "n".to_string(),
            config: template.default_config(),
            position: Position::default(),
            data: template.default_data(),
        }
    }

    #[test]
    fn test_every_tag_round_trips_through_its_default_config() {
        let registry = NodeRegistry::new();
        for template in registry.templates() {
            let node = node_from(&registry, template.tag);
            assert_eq!(NodeTag::of_config(&node.config), template.tag, "tag {}", template.tag);
            assert_eq!(registry.shape_of(&node.config), template.tag.shape());
            assert_eq!(node.kind(), template.tag.kind());
        }
    }

    #[test]
    fn test_stop_workflow_has_no_outputs() {
        let registry = NodeRegistry::new();
        let node = node_from(&registry, NodeTag::StopWorkflow);
        assert!(node.is_terminal());
        assert!(registry.shape_of(&node.config).output_handles().is_empty());
        assert!(!NodeShape::of(&node.config).has_outputs());
    }

    #[test]
    fn test_condition_exposes_true_and_false_handles() {
        let registry = NodeRegistry::new();
        let shape = registry.template(NodeTag::Conditional).shape;
        assert_eq!(shape.output_handles(), vec![Some(TRUE_HANDLE), Some(FALSE_HANDLE)]);
        assert!(!registry.template(NodeTag::Trigger).shape.accepts_input);
    }

    #[test]
    fn test_tags_serialize_kebab_case() {
        let value = serde_json::to_value(NodeTag::SearchKnowledgebase).unwrap();
        assert_eq!(value, "search-knowledgebase");
        let tag: NodeTag = serde_json::from_value(serde_json::json!("stop-workflow")).unwrap();
        assert_eq!(tag, NodeTag::StopWorkflow);
    }
}
