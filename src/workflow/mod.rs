/// Workflow Builder Core
///
/// Everything needed to edit a workflow graph without a browser:
/// - Type definitions (nodes, edges, configuration, form payload)
/// - Node palette registry and connection policy
/// - Reducer-based graph store with bounded undo/redo
/// - Node configuration panel and whole-workflow validation

// Core workflow type definitions
pub mod types;

// Palette tags, shapes and default configurations
pub mod registry;

// Petgraph analysis used for warnings and auto-layout
pub mod graph;

// Edge admission rules
pub mod policy;

// Bounded undo/redo stacks
pub mod history;

// Reducer over graph actions
pub mod store;

// Staged per-node configuration editing
pub mod panel;

// Field-level workflow validation
pub mod validation;

// Re-export commonly used types
pub use panel::NodeConfigPanel;
pub use policy::{ConnectionPolicy, Rejection};
pub use registry::{NodeRegistry, NodeTag};
pub use store::{GraphAction, GraphStore, NodeDataPatch, StoreError};
pub use types::{
    Connection, NodeConfig, NodeKind, Position, WorkflowConfiguration, WorkflowDefinition, WorkflowEdge,
    WorkflowExport, WorkflowFormData, WorkflowNode,
};
pub use validation::{validate_workflow, FieldError, ValidationReport};
