/// Workflow Studio: headless builder for AI workflows
///
/// This library provides the editing core of a visual workflow builder: a typed node
/// graph with connection rules, reducer-driven undo/redo, per-node configuration and
/// whole-workflow validation, plus the client that saves workflows to the backend API.

// Core configuration and setup
pub mod config;

// Workflow builder core - types, registry, connection policy, store, panel and validation
pub mod workflow;

// Persistence adapter - REST client for the external workflow API
pub mod client;

// Editing sessions - one graph store per open editor plus the save flow
pub mod session;

// HTTP API layer - palette, session and workflow pass-through endpoints
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use client::{WorkflowApiClient, WorkflowBackend};
pub use session::{EditorSession, SessionManager};
pub use server::start_server;
pub use workflow::{GraphAction, GraphStore, NodeTag, ValidationReport, WorkflowNode};
