/// Session manager
///
/// Keeps every open [`EditorSession`] keyed by id and runs the save flow against the
/// workflow backend. Graph edits happen under the session's mutex; the network half of a
/// save runs with the lock released so the session stays readable while it is in flight.

use crate::client::{models::AiWorkflow, WorkflowBackend};
use crate::session::{EditorSession, SessionError};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub type SharedSession = Arc<Mutex<EditorSession>>;

pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    backend: Arc<dyn WorkflowBackend>,
    history_limit: usize,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn WorkflowBackend>, history_limit: usize) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), backend, history_limit }
    }

    pub fn backend(&self) -> &Arc<dyn WorkflowBackend> {
        &self.backend
    }

    /// Open a new session, blank or loaded from an existing workflow
    pub async fn create(&self, workflow_id: Option<&str>) -> Result<(Uuid, SharedSession), SessionError> {
        let id = Uuid::new_v4();
        let session = match workflow_id {
            Some(workflow_id) => {
                tracing::info!("📥 Loading workflow {} into session {}", workflow_id, id);
                let workflow = self.backend.get_workflow(workflow_id).await?;
                EditorSession::from_workflow(id, self.history_limit, &workflow)
            }
            None => EditorSession::new(id, self.history_limit),
        };

        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&shared));
        tracing::info!("✅ Opened editing session {}", id);
        Ok((id, shared))
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedSession, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!("🧹 Closed editing session {}", id);
        }
        removed
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Validate, then create or update the workflow on the backend.
    ///
    /// The request and the bookkeeping after it run on their own task, so dropping this
    /// future never leaves the session stuck in the saving state. The outcome is recorded
    /// on the session unless it was closed mid-save.
    pub async fn save(&self, id: Uuid) -> Result<AiWorkflow, SessionError> {
        let session = self.get(id).await?;
        let (form, workflow_id) = session.lock().await.begin_save()?;

        tracing::info!("💾 Saving session {} ({})", id, workflow_id.as_deref().unwrap_or("new workflow"));
        let backend = Arc::clone(&self.backend);
        let task = tokio::spawn(async move {
            let result = match &workflow_id {
                Some(workflow_id) => backend.update_workflow(workflow_id, &form).await,
                None => backend.create_workflow(&form).await,
            };
            // a closed session is only held here, so recording on it drops the result
            session.lock().await.finish_save(&result);
            result
        });

        let result = task.await?;
        if !self.contains(id).await {
            tracing::debug!("Session {} closed during save, dropping result", id);
        }

        match result {
            Ok(workflow) => {
                tracing::info!("✅ Saved workflow {}", workflow.id);
                Ok(workflow)
            }
            Err(e) => {
                tracing::warn!("❌ Save of session {} failed: {}", id, e);
                Err(e.into())
            }
        }
    }
}
