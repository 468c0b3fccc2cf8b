/// Graph state store
///
/// Holds the nodes and edges of the workflow being edited and applies every change through
/// a single reducer (`dispatch`) over [`GraphAction`] values. Each successful mutation
/// checkpoints the previous `{nodes, edges}` into the bounded undo history; failed actions
/// leave both state and history untouched.

use crate::workflow::{
    graph::WorkflowGraph,
    history::{GraphSnapshot, History, DEFAULT_HISTORY_LIMIT},
    policy::{ConnectionPolicy, Rejection},
    registry::{NodeRegistry, NodeTag},
    types::{
        Connection, NodeConfig, NodeData, NodeKind, Position, WorkflowDefinition, WorkflowEdge,
        WorkflowExport, WorkflowNode, DEFINITION_VERSION,
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Offset applied to duplicated nodes
const DUPLICATE_OFFSET: f64 = 50.0;

/// Partial update of a node's data and configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDataPatch {
    pub label: Option<String>,
    /// An empty string clears the description
    pub description: Option<String>,
    pub enabled: Option<bool>,
    /// Must keep the node's kind
    pub config: Option<NodeConfig>,
}

impl NodeDataPatch {
    fn apply(self, node: &mut WorkflowNode) {
        if let Some(label) = self.label {
            node.data.label = label;
        }
        if let Some(description) = self.description {
            node.data.description = if description.is_empty() { None } else { Some(description) };
        }
        if let Some(enabled) = self.enabled {
            node.data.enabled = enabled;
        }
        if let Some(config) = self.config {
            node.config = config;
        }
    }
}

/// Every change the editor can make to the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GraphAction {
    AddNode {
        tag: NodeTag,
        #[serde(default)]
        position: Position,
        #[serde(default)]
        data: Option<NodeData>,
    },
    UpdateNodeData {
        id: String,
        patch: NodeDataPatch,
    },
    MoveNode {
        id: String,
        position: Position,
    },
    DuplicateNode {
        id: String,
    },
    DeleteNode {
        id: String,
    },
    DeleteEdge {
        id: String,
    },
    Connect {
        connection: Connection,
    },
    AutoLayout,
    Undo,
    Redo,
    Import {
        workflow: WorkflowExport,
    },
    Reset,
}

impl GraphAction {
    pub fn name(&self) -> &'static str {
        match self {
            GraphAction::AddNode { .. } => "add_node",
            GraphAction::UpdateNodeData { .. } => "update_node_data",
            GraphAction::MoveNode { .. } => "move_node",
            GraphAction::DuplicateNode { .. } => "duplicate_node",
            GraphAction::DeleteNode { .. } => "delete_node",
            GraphAction::DeleteEdge { .. } => "delete_edge",
            GraphAction::Connect { .. } => "connect",
            GraphAction::AutoLayout => "auto_layout",
            GraphAction::Undo => "undo",
            GraphAction::Redo => "redo",
            GraphAction::Import { .. } => "import",
            GraphAction::Reset => "reset",
        }
    }
}

/// What a dispatched action did
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ActionOutcome {
    /// False when the action was a no-op (e.g. undo with empty history)
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
}

impl ActionOutcome {
    fn changed() -> Self {
        Self { changed: true, ..Default::default() }
    }

    fn unchanged() -> Self {
        Self::default()
    }

    fn node(id: String) -> Self {
        Self { changed: true, node_id: Some(id), edge_id: None }
    }

    fn edge(id: String) -> Self {
        Self { changed: true, node_id: None, edge_id: Some(id) }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("node '{0}' not found")]
    NodeNotFound(String),
    #[error("edge '{0}' not found")]
    EdgeNotFound(String),
    #[error("node '{id}' is a {expected} node, got {found} configuration")]
    KindMismatch { id: String, expected: NodeKind, found: NodeKind },
    #[error("connection rejected: {0}")]
    Rejected(#[from] Rejection),
}

/// In-memory editing state for one workflow
#[derive(Debug, Clone)]
pub struct GraphStore {
    name: String,
    description: Option<String>,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    history: History,
    /// Suffix for the next generated node id
    next_id: u64,
    registry: NodeRegistry,
    policy: ConnectionPolicy,
}

impl GraphStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            name: String::new(),
            description: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            history: History::new(history_limit),
            next_id: 1,
            registry: NodeRegistry::new(),
            policy: ConnectionPolicy,
        }
    }

    // ---- reads ----

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot { nodes: self.nodes.clone(), edges: self.edges.clone() }
    }

    pub fn definition(&self) -> WorkflowDefinition {
        WorkflowDefinition {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            version: DEFINITION_VERSION.to_string(),
        }
    }

    /// Name and description are form metadata; they do not go through history
    pub fn set_metadata(&mut self, name: impl Into<String>, description: Option<String>) {
        self.name = name.into();
        self.description = description.filter(|d| !d.is_empty());
    }

    // ---- convenience wrappers over dispatch ----

    pub fn add_node(&mut self, tag: NodeTag, data: Option<NodeData>, position: Position) -> String {
        // add_node cannot fail
        self.dispatch(GraphAction::AddNode { tag, position, data })
            .ok()
            .and_then(|outcome| outcome.node_id)
            .unwrap_or_default()
    }

    pub fn update_node_data(&mut self, id: &str, patch: NodeDataPatch) -> Result<(), StoreError> {
        self.dispatch(GraphAction::UpdateNodeData { id: id.to_string(), patch }).map(|_| ())
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), StoreError> {
        self.dispatch(GraphAction::MoveNode { id: id.to_string(), position }).map(|_| ())
    }

    pub fn duplicate_node(&mut self, id: &str) -> Result<String, StoreError> {
        let outcome = self.dispatch(GraphAction::DuplicateNode { id: id.to_string() })?;
        Ok(outcome.node_id.unwrap_or_default())
    }

    pub fn delete_node(&mut self, id: &str) -> Result<(), StoreError> {
        self.dispatch(GraphAction::DeleteNode { id: id.to_string() }).map(|_| ())
    }

    pub fn delete_edge(&mut self, id: &str) -> Result<(), StoreError> {
        self.dispatch(GraphAction::DeleteEdge { id: id.to_string() }).map(|_| ())
    }

    /// Returns the id of the new edge, or the reason it was refused
    pub fn on_connect(&mut self, connection: Connection) -> Result<String, StoreError> {
        let outcome = self.dispatch(GraphAction::Connect { connection })?;
        Ok(outcome.edge_id.unwrap_or_default())
    }

    pub fn auto_layout(&mut self) {
        let _ = self.dispatch(GraphAction::AutoLayout);
    }

    /// Returns false when there was nothing to undo
    pub fn undo(&mut self) -> bool {
        self.dispatch(GraphAction::Undo).map(|o| o.changed).unwrap_or(false)
    }

    pub fn redo(&mut self) -> bool {
        self.dispatch(GraphAction::Redo).map(|o| o.changed).unwrap_or(false)
    }

    pub fn export_workflow(&self) -> WorkflowExport {
        WorkflowExport {
            name: self.name.clone(),
            description: self.description.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    pub fn import_workflow(&mut self, workflow: WorkflowExport) {
        let _ = self.dispatch(GraphAction::Import { workflow });
    }

    pub fn reset_workflow(&mut self) {
        let _ = self.dispatch(GraphAction::Reset);
    }

    // ---- reducer ----

    pub fn dispatch(&mut self, action: GraphAction) -> Result<ActionOutcome, StoreError> {
        let name = action.name();
        let result = self.reduce(action);
        match &result {
            Ok(outcome) => tracing::debug!("🧩 {} applied (changed: {})", name, outcome.changed),
            Err(StoreError::Rejected(reason)) => tracing::warn!("🚫 Connection rejected: {}", reason),
            Err(e) => tracing::debug!("⚠️ {} failed: {}", name, e),
        }
        result
    }

    fn reduce(&mut self, action: GraphAction) -> Result<ActionOutcome, StoreError> {
        match action {
            GraphAction::AddNode { tag, position, data } => {
                let template = self.registry.template(tag);
                let config = template.default_config();
                let data = data.unwrap_or_else(|| template.default_data());
                let node = WorkflowNode { id: self.generate_node_id(tag.kind()), config, position, data };
                let id = node.id.clone();
                self.checkpoint();
                self.nodes.push(node);
                Ok(ActionOutcome::node(id))
            }
            GraphAction::UpdateNodeData { id, patch } => {
                let index = self.node_index(&id)?;
                if let Some(config) = &patch.config {
                    let expected = self.nodes[index].kind();
                    if config.kind() != expected {
                        return Err(StoreError::KindMismatch { id, expected, found: config.kind() });
                    }
                    // a node with successors cannot become terminal
                    let has_outgoing = self.edges.iter().any(|e| e.source == id);
                    if has_outgoing && !self.registry.shape_of(config).has_outputs() {
                        return Err(StoreError::Rejected(Rejection::TerminalSource));
                    }
                }
                self.checkpoint();
                patch.apply(&mut self.nodes[index]);
                Ok(ActionOutcome::node(id))
            }
            GraphAction::MoveNode { id, position } => {
                let index = self.node_index(&id)?;
                self.checkpoint();
                self.nodes[index].position = position;
                Ok(ActionOutcome::node(id))
            }
            GraphAction::DuplicateNode { id } => {
                let index = self.node_index(&id)?;
                let mut copy = self.nodes[index].clone();
                copy.id = self.generate_node_id(copy.kind());
                copy.position = copy.position.offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
                let new_id = copy.id.clone();
                self.checkpoint();
                self.nodes.push(copy);
                Ok(ActionOutcome::node(new_id))
            }
            GraphAction::DeleteNode { id } => {
                let index = self.node_index(&id)?;
                self.checkpoint();
                self.nodes.remove(index);
                self.edges.retain(|e| e.source != id && e.target != id);
                Ok(ActionOutcome::node(id))
            }
            GraphAction::DeleteEdge { id } => {
                let index = self
                    .edges
                    .iter()
                    .position(|e| e.id == id)
                    .ok_or_else(|| StoreError::EdgeNotFound(id.clone()))?;
                self.checkpoint();
                self.edges.remove(index);
                Ok(ActionOutcome::edge(id))
            }
            GraphAction::Connect { connection } => {
                let admission = self.policy.evaluate(&connection, &self.nodes, &self.edges)?;
                let edge = WorkflowEdge {
                    id: format!("edge-{}", Uuid::new_v4()),
                    source: connection.source,
                    target: connection.target,
                    source_handle: connection.source_handle,
                    target_handle: connection.target_handle,
                    label: admission.label,
                    style: admission.style,
                };
                let id = edge.id.clone();
                self.checkpoint();
                self.edges.push(edge);
                Ok(ActionOutcome::edge(id))
            }
            GraphAction::AutoLayout => {
                let positions = WorkflowGraph::build(&self.nodes, &self.edges).layout();
                self.checkpoint();
                for node in &mut self.nodes {
                    if let Some(position) = positions.get(&node.id) {
                        node.position = *position;
                    }
                }
                Ok(ActionOutcome::changed())
            }
            GraphAction::Undo => {
                let current = self.snapshot();
                match self.history.undo(current) {
                    Some(previous) => {
                        self.restore(previous);
                        Ok(ActionOutcome::changed())
                    }
                    None => Ok(ActionOutcome::unchanged()),
                }
            }
            GraphAction::Redo => {
                let current = self.snapshot();
                match self.history.redo(current) {
                    Some(next) => {
                        self.restore(next);
                        Ok(ActionOutcome::changed())
                    }
                    None => Ok(ActionOutcome::unchanged()),
                }
            }
            GraphAction::Import { workflow } => {
                tracing::info!(
                    "📥 Importing workflow '{}' ({} nodes, {} edges)",
                    workflow.name,
                    workflow.nodes.len(),
                    workflow.edges.len()
                );
                self.name = workflow.name;
                self.description = workflow.description;
                self.nodes = workflow.nodes;
                self.edges = workflow.edges;
                self.next_id = next_id_after(&self.nodes);
                self.history.clear();
                Ok(ActionOutcome::changed())
            }
            GraphAction::Reset => {
                self.name.clear();
                self.description = None;
                self.nodes.clear();
                self.edges.clear();
                self.next_id = 1;
                self.history.clear();
                Ok(ActionOutcome::changed())
            }
        }
    }

    fn checkpoint(&mut self) {
        let before = self.snapshot();
        self.history.checkpoint(before);
    }

    fn restore(&mut self, snapshot: GraphSnapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
    }

    fn node_index(&self, id: &str) -> Result<usize, StoreError> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| StoreError::NodeNotFound(id.to_string()))
    }

    fn generate_node_id(&mut self, kind: NodeKind) -> String {
        loop {
            let id = format!("{}-{}", kind.as_str(), self.next_id);
            // wraps to 1; taken ids are skipped below
            self.next_id = self.next_id.checked_add(1).unwrap_or(1);
            if self.node(&id).is_none() {
                return id;
            }
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

/// First counter value that cannot collide with the numeric suffix of an existing id
fn next_id_after(nodes: &[WorkflowNode]) -> u64 {
    nodes
        .iter()
        .filter_map(|n| n.id.rsplit('-').next()?.parse::<u64>().ok())
        .max()
        .and_then(|max| max.checked_add(1))
        .unwrap_or(1)
}
