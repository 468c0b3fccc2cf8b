/// Studio editing sessions
///
/// An [`EditorSession`] is one open editor tab: the graph store, the node panel if one is
/// open, the workflow-level configuration and the save state. Sessions live in the
/// [`SessionManager`], which also owns the backend they save through.

// Session registry and save flow
pub mod manager;

pub use manager::SessionManager;

use crate::client::{models::AiWorkflow, ApiError};
use crate::workflow::{
    panel::{NodeConfigPanel, PanelError, PanelField},
    store::{ActionOutcome, GraphAction, GraphStore, StoreError},
    types::{WorkflowConfiguration, WorkflowEdge, WorkflowExport, WorkflowFormData, WorkflowNode},
    validation::{validate_workflow, ValidationReport},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session '{0}' not found")]
    NotFound(Uuid),
    #[error("no node panel is open")]
    PanelClosed,
    #[error(transparent)]
    Panel(#[from] PanelError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("workflow has {} validation error(s)", .0.errors.len())]
    Invalid(ValidationReport),
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error(transparent)]
    Backend(#[from] ApiError),
    #[error("save task failed: {0}")]
    SaveTask(#[from] tokio::task::JoinError),
}

/// Snapshot of the open panel for rendering
#[derive(Debug, Clone, Serialize)]
pub struct PanelView {
    pub node_id: String,
    pub dirty: bool,
    pub fields: Vec<PanelField>,
}

/// Everything a client needs to render the editor
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub configuration: WorkflowConfiguration,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub saving: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<PanelView>,
}

#[derive(Debug)]
pub struct EditorSession {
    id: Uuid,
    store: GraphStore,
    panel: Option<NodeConfigPanel>,
    configuration: WorkflowConfiguration,
    /// Set once the workflow exists on the backend
    workflow_id: Option<String>,
    last_error: Option<String>,
    saving: bool,
}

impl EditorSession {
    pub fn new(id: Uuid, history_limit: usize) -> Self {
        Self {
            id,
            store: GraphStore::new(history_limit),
            panel: None,
            configuration: WorkflowConfiguration::default(),
            workflow_id: None,
            last_error: None,
            saving: false,
        }
    }

    /// Session editing an existing workflow; history starts empty
    pub fn from_workflow(id: Uuid, history_limit: usize, workflow: &AiWorkflow) -> Self {
        let mut session = Self::new(id, history_limit);
        session.store.import_workflow(WorkflowExport {
            name: workflow.name.clone(),
            description: workflow.description.clone(),
            nodes: workflow.workflow_definition.nodes.clone(),
            edges: workflow.workflow_definition.edges.clone(),
        });
        session.configuration = workflow.configuration.clone();
        session.workflow_id = Some(workflow.id.clone());
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    pub fn configuration(&self) -> &WorkflowConfiguration {
        &self.configuration
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn panel(&self) -> Option<&NodeConfigPanel> {
        self.panel.as_ref()
    }

    /// Apply one graph action; closes the panel if its node disappeared
    pub fn dispatch(&mut self, action: GraphAction) -> Result<ActionOutcome, SessionError> {
        let outcome = self.store.dispatch(action)?;
        if let Some(panel) = &self.panel {
            if self.store.node(panel.node_id()).is_none() {
                tracing::debug!("🧹 Closing panel for removed node {}", panel.node_id());
                self.panel = None;
            }
        }
        Ok(outcome)
    }

    pub fn set_metadata(
        &mut self,
        name: String,
        description: Option<String>,
        configuration: Option<WorkflowConfiguration>,
    ) {
        self.store.set_metadata(name, description);
        if let Some(configuration) = configuration {
            self.configuration = configuration;
        }
    }

    pub fn form_data(&self) -> WorkflowFormData {
        WorkflowFormData {
            name: self.store.name().to_string(),
            description: self.store.description().map(str::to_string),
            configuration: self.configuration.clone(),
            workflow_definition: self.store.definition(),
        }
    }

    pub fn validate(&self) -> ValidationReport {
        validate_workflow(&self.form_data())
    }

    /// Open the panel on a node, discarding any uncommitted draft
    pub fn open_panel(&mut self, node_id: &str) -> Result<&NodeConfigPanel, SessionError> {
        let panel = NodeConfigPanel::open(&self.store, node_id)?;
        Ok(self.panel.insert(panel))
    }

    pub fn close_panel(&mut self) {
        if let Some(panel) = self.panel.take() {
            panel.discard();
        }
    }

    pub fn set_panel_field(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        let panel = self.panel.as_mut().ok_or(SessionError::PanelClosed)?;
        panel.set_field(key, value)?;
        Ok(())
    }

    /// Write the draft to the store and close the panel; on failure the draft stays open
    pub fn commit_panel(&mut self) -> Result<(), SessionError> {
        let panel = self.panel.take().ok_or(SessionError::PanelClosed)?;
        if let Err(e) = panel.clone().commit(&mut self.store) {
            self.panel = Some(panel);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Validate and mark the session as saving.
    ///
    /// Returns the payload to send and the id to update, if any.
    pub fn begin_save(&mut self) -> Result<(WorkflowFormData, Option<String>), SessionError> {
        let report = self.validate();
        if !report.is_valid {
            return Err(SessionError::Invalid(report));
        }
        if self.saving {
            return Err(SessionError::SaveInFlight);
        }
        self.saving = true;
        Ok((self.form_data(), self.workflow_id.clone()))
    }

    pub fn finish_save(&mut self, result: &Result<AiWorkflow, ApiError>) {
        self.saving = false;
        match result {
            Ok(workflow) => {
                self.workflow_id = Some(workflow.id.clone());
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            workflow_id: self.workflow_id.clone(),
            name: self.store.name().to_string(),
            description: self.store.description().map(str::to_string),
            configuration: self.configuration.clone(),
            nodes: self.store.nodes().to_vec(),
            edges: self.store.edges().to_vec(),
            can_undo: self.store.can_undo(),
            can_redo: self.store.can_redo(),
            saving: self.saving,
            last_error: self.last_error.clone(),
            panel: self.panel.as_ref().map(|panel| PanelView {
                node_id: panel.node_id().to_string(),
                dirty: panel.is_dirty(),
                fields: panel.fields(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{
        history::DEFAULT_HISTORY_LIMIT,
        registry::NodeTag,
        types::{Connection, Position},
    };

    fn session_with_chain() -> (EditorSession, String, String) {
        let mut session = EditorSession::new(Uuid::new_v4(), DEFAULT_HISTORY_LIMIT);
        session.set_metadata("Onboarding".to_string(), None, None);
        let trigger = session.store.add_node(NodeTag::Trigger, None, Position::default());
        let search = session.store.add_node(NodeTag::SearchKnowledgebase, None, Position::new(0.0, 150.0));
        session
            .store
            .on_connect(Connection::new(&trigger, &search))
            .unwrap();
        (session, trigger, search)
    }

    #[test]
    fn test_panel_closes_when_node_deleted() {
        let (mut session, _, search) = session_with_chain();
        session.open_panel(&search).unwrap();
        assert!(session.panel().is_some());

        session.dispatch(GraphAction::DeleteNode { id: search }).unwrap();
        assert!(session.panel().is_none());
    }

    #[test]
    fn test_commit_panel_keeps_draft_on_error() {
        let (mut session, _, search) = session_with_chain();
        session.open_panel(&search).unwrap();
        session.set_panel_field("label", "Lookup").unwrap();

        // node vanishes behind the panel's back
        session.store.delete_node(&search).unwrap();
        assert!(session.commit_panel().is_err());
        assert!(session.panel().is_some());
    }

    #[test]
    fn test_panel_field_without_panel() {
        let (mut session, _, _) = session_with_chain();
        assert!(matches!(session.set_panel_field("label", "x"), Err(SessionError::PanelClosed)));
    }

    #[test]
    fn test_begin_save_rejects_invalid_workflow() {
        let mut session = EditorSession::new(Uuid::new_v4(), DEFAULT_HISTORY_LIMIT);
        match session.begin_save() {
            Err(SessionError::Invalid(report)) => {
                assert!(report.has_error("name", "Workflow name is required"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(!session.is_saving());
    }

    #[test]
    fn test_second_save_while_in_flight() {
        let (mut session, _, search) = session_with_chain();
        session.open_panel(&search).unwrap();
        session.set_panel_field("kb.knowledge_base_id", "kb_docs").unwrap();
        session.set_panel_field("kb.query", "{{input.question}}").unwrap();
        session.commit_panel().unwrap();

        let (form, workflow_id) = session.begin_save().unwrap();
        assert_eq!(form.name, "Onboarding");
        assert!(workflow_id.is_none());
        assert!(matches!(session.begin_save(), Err(SessionError::SaveInFlight)));

        session.finish_save(&Err(ApiError::Status { status: 500, message: "boom".to_string() }));
        assert!(!session.is_saving());
        assert_eq!(session.last_error(), Some("boom (HTTP 500)"));

        session.dismiss_error();
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_from_workflow_starts_clean() {
        let (session, _, _) = session_with_chain();
        let workflow = AiWorkflow {
            id: "wf_9".to_string(),
            deployment_id: None,
            name: "Loaded".to_string(),
            description: Some("from backend".to_string()),
            configuration: WorkflowConfiguration::default(),
            workflow_definition: session.store().definition(),
            status: None,
            created_at: None,
            updated_at: None,
        };

        let loaded = EditorSession::from_workflow(Uuid::new_v4(), DEFAULT_HISTORY_LIMIT, &workflow);
        assert_eq!(loaded.workflow_id(), Some("wf_9"));
        assert_eq!(loaded.store().nodes(), session.store().nodes());
        assert!(!loaded.store().can_undo());
        assert_eq!(loaded.view().description.as_deref(), Some("from backend"));
    }
}
