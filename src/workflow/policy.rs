/// Connection policy
///
/// Decides whether a proposed edge may enter the graph. Rules are evaluated in order and
/// the first one that matches wins. Accepted condition edges come back labelled and
/// styled per branch so the store can append them as-is.

use crate::workflow::registry::{NodeShape, OutputPorts, TRUE_HANDLE};
use crate::workflow::types::{Connection, EdgeStyle, WorkflowEdge, WorkflowNode};
use serde::Serialize;
use thiserror::Error;

const TRUE_STROKE: &str = "#22c55e";
const FALSE_STROKE: &str = "#ef4444";

/// Why a connection was refused
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    #[error("a node cannot connect to itself")]
    SelfLoop,
    #[error("node '{id}' does not exist")]
    UnknownNode { id: String },
    #[error("trigger nodes cannot have incoming connections")]
    TargetIsTrigger,
    #[error("condition nodes cannot connect directly to other condition nodes")]
    ConditionToCondition,
    #[error("the '{handle}' branch of this condition is already connected")]
    BranchAlreadyConnected { handle: String },
    #[error("stop-workflow nodes have no outputs")]
    TerminalSource,
    #[error("node '{id}' already has an outgoing connection")]
    SourceAlreadyConnected { id: String },
}

/// Edge attributes decided by the policy for an accepted connection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Admission {
    pub label: Option<String>,
    pub style: Option<EdgeStyle>,
}

/// Stateless edge admission rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionPolicy;

impl ConnectionPolicy {
    pub fn evaluate(
        &self,
        connection: &Connection,
        nodes: &[WorkflowNode],
        edges: &[WorkflowEdge],
    ) -> Result<Admission, Rejection> {
        if connection.source == connection.target {
            return Err(Rejection::SelfLoop);
        }

        let find = |id: &str| {
            nodes
                .iter()
                .find(|n| n.id == id)
                .ok_or_else(|| Rejection::UnknownNode { id: id.to_string() })
        };
        let source = find(&connection.source)?;
        let target = find(&connection.target)?;
        let source_shape = NodeShape::of(&source.config);

        if !NodeShape::of(&target.config).accepts_input {
            return Err(Rejection::TargetIsTrigger);
        }

        let mut outgoing = edges.iter().filter(|e| e.source == source.id);

        if source_shape.outputs == OutputPorts::Branch {
            if target.is_condition() {
                return Err(Rejection::ConditionToCondition);
            }
            if outgoing.any(|e| e.source_handle == connection.source_handle) {
                return Err(Rejection::BranchAlreadyConnected {
                    handle: connection.source_handle.clone().unwrap_or_default(),
                });
            }

            let is_true = connection.source_handle.as_deref() == Some(TRUE_HANDLE);
            let (label, stroke) = if is_true { ("True", TRUE_STROKE) } else { ("False", FALSE_STROKE) };
            return Ok(Admission {
                label: Some(label.to_string()),
                style: Some(EdgeStyle { stroke: stroke.to_string() }),
            });
        }

        if !source_shape.has_outputs() {
            return Err(Rejection::TerminalSource);
        }

        if outgoing.next().is_some() {
            return Err(Rejection::SourceAlreadyConnected { id: source.id.clone() });
        }

        Ok(Admission::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::registry::{NodeRegistry, NodeTag, FALSE_HANDLE};
    use crate::workflow::types::Position;

    fn node(id: &str, tag: NodeTag) -> WorkflowNode {
        let registry = NodeRegistry::new();
        let template = registry.template(tag);
        WorkflowNode {
            id: id.to_string(),
            config: template.default_config(),
            position: Position::default(),
            data: template.default_data(),
        }
    }

    fn edge_from(connection: &Connection) -> WorkflowEdge {
        WorkflowEdge {
            id: format!("{}-{}", connection.source, connection.target),
            source: connection.source.clone(),
            target: connection.target.clone(),
            source_handle: connection.source_handle.clone(),
            target_handle: None,
            label: None,
            style: None,
        }
    }

    fn fixture() -> Vec<WorkflowNode> {
        vec![
            node("trigger", NodeTag::Trigger),
            node("api", NodeTag::RestApi),
            node("cond", NodeTag::Condition),
            node("cond2", NodeTag::Conditional),
            node("stop", NodeTag::StopWorkflow),
            node("map", NodeTag::Transform),
        ]
    }

    #[test]
    fn test_self_loop_rejected_for_every_kind() {
        let nodes = fixture();
        for n in &nodes {
            let result = ConnectionPolicy.evaluate(&Connection::new(&n.id, &n.id), &nodes, &[]);
            assert_eq!(result, Err(Rejection::SelfLoop));
        }
    }

    #[test]
    fn test_trigger_is_never_a_target() {
        let nodes = fixture();
        for n in nodes.iter().filter(|n| n.id != "trigger") {
            let result = ConnectionPolicy.evaluate(&Connection::new(&n.id, "trigger"), &nodes, &[]);
            assert_eq!(result, Err(Rejection::TargetIsTrigger), "source {}", n.id);
        }
    }

    #[test]
    fn test_unknown_endpoints_rejected() {
        let nodes = fixture();
        let result = ConnectionPolicy.evaluate(&Connection::new("api", "nope"), &nodes, &[]);
        assert_eq!(result, Err(Rejection::UnknownNode { id: "nope".to_string() }));
    }

    #[test]
    fn test_condition_branches_fan_out_once_each() {
        let nodes = fixture();
        let mut edges = Vec::new();

        let yes = Connection::new("cond", "api").with_source_handle(TRUE_HANDLE);
        let admission = ConnectionPolicy.evaluate(&yes, &nodes, &edges).unwrap();
        assert_eq!(admission.label.as_deref(), Some("True"));
        assert_eq!(admission.style.as_ref().unwrap().stroke, TRUE_STROKE);
        edges.push(edge_from(&yes));

        let again = Connection::new("cond", "map").with_source_handle(TRUE_HANDLE);
        assert_eq!(
            ConnectionPolicy.evaluate(&again, &nodes, &edges),
            Err(Rejection::BranchAlreadyConnected { handle: TRUE_HANDLE.to_string() })
        );

        let no = Connection::new("cond", "map").with_source_handle(FALSE_HANDLE);
        let admission = ConnectionPolicy.evaluate(&no, &nodes, &edges).unwrap();
        assert_eq!(admission.label.as_deref(), Some("False"));
        assert_eq!(admission.style.unwrap().stroke, FALSE_STROKE);
    }

    #[test]
    fn test_condition_cannot_chain_into_condition() {
        let nodes = fixture();
        let connection = Connection::new("cond", "cond2").with_source_handle(TRUE_HANDLE);
        assert_eq!(
            ConnectionPolicy.evaluate(&connection, &nodes, &[]),
            Err(Rejection::ConditionToCondition)
        );
    }

    #[test]
    fn test_stop_workflow_has_no_outputs() {
        let nodes = fixture();
        assert_eq!(
            ConnectionPolicy.evaluate(&Connection::new("stop", "api"), &nodes, &[]),
            Err(Rejection::TerminalSource)
        );
    }

    #[test]
    fn test_linear_nodes_have_a_single_successor() {
        let nodes = fixture();
        let first = Connection::new("api", "map");
        assert_eq!(ConnectionPolicy.evaluate(&first, &nodes, &[]), Ok(Admission::default()));

        let edges = vec![edge_from(&first)];
        assert_eq!(
            ConnectionPolicy.evaluate(&Connection::new("api", "stop"), &nodes, &edges),
            Err(Rejection::SourceAlreadyConnected { id: "api".to_string() })
        );

        // fan-in is allowed
        assert!(ConnectionPolicy.evaluate(&Connection::new("trigger", "map"), &nodes, &edges).is_ok());
    }
}
