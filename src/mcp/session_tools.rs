//! Tool handlers bound to per-client sessions.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use super::tools::ToolHandler;
use crate::models::SessionContext;
use crate::orchestrator::{Orchestrator, OrchestratorError};

type SessionHandle = Arc<Mutex<SessionContext>>;

/// Orchestrator plus one [`SessionContext`] per transport session.
///
/// Sessions are keyed by the MCP session id; stdio carries none, so a stdio
/// client gets the single `None` session. Each session's mutex is held for
/// the whole of a tool call, so actions within a session never interleave.
#[derive(Debug, Clone)]
pub struct SessionStore {
    orchestrator: Arc<Orchestrator>,
    sessions: Arc<Mutex<HashMap<Option<String>, SessionHandle>>>,
}

impl SessionStore {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Session for `session_id`, created on first use
    async fn session(&self, session_id: Option<&str>) -> SessionHandle {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.map(str::to_string))
            .or_insert_with(|| {
                tracing::debug!(session = session_id.unwrap_or("stdio"), "new session");
                Arc::new(Mutex::new(self.orchestrator.new_session()))
            })
            .clone()
    }

    /// Snapshot of a session's state, `None` if it has not been used yet
    pub async fn snapshot(&self, session_id: Option<&str>) -> Option<SessionContext> {
        let handle = self
            .sessions
            .lock()
            .await
            .get(&session_id.map(str::to_string))
            .cloned()?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Number of sessions seen so far
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn error_value(err: &OrchestratorError) -> String {
    format!("[{}] {}", err.code(), err.user_message())
}

fn str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing '{}' parameter", name))
}

fn status_value(orchestrator: &Orchestrator, session: &SessionContext) -> Value {
    json!({
        "unlocked": session.is_unlocked(),
        "gated": orchestrator.is_gated(),
        "usage_count": session.usage_count(),
        "remaining_quota": orchestrator.remaining_quota(session),
        "max_usage": orchestrator.policy().max_usage,
        "has_result": session.result().is_some(),
        "credential": if orchestrator.has_configured_api_key() {
            "configured"
        } else if session.has_session_api_key() {
            "session"
        } else {
            "missing"
        },
        "started_at": session.started_at().to_rfc3339(),
    })
}

#[derive(Debug)]
pub struct UnlockHandler {
    pub store: SessionStore,
}

#[async_trait::async_trait]
impl ToolHandler for UnlockHandler {
    async fn execute(&self, args: Value, session_id: Option<&str>) -> Result<Value, String> {
        let password = str_arg(&args, "password")?;
        let orchestrator = self.store.orchestrator();

        let handle = self.store.session(session_id).await;
        let mut session = handle.lock().await;
        orchestrator
            .unlock(&mut session, password)
            .map_err(|e| error_value(&e))?;

        Ok(json!({
            "unlocked": true,
            "remaining_quota": orchestrator.remaining_quota(&session),
        }))
    }
}

#[derive(Debug)]
pub struct SetApiKeyHandler {
    pub store: SessionStore,
}

#[async_trait::async_trait]
impl ToolHandler for SetApiKeyHandler {
    async fn execute(&self, args: Value, session_id: Option<&str>) -> Result<Value, String> {
        let api_key = str_arg(&args, "api_key")?;
        let orchestrator = self.store.orchestrator();

        let handle = self.store.session(session_id).await;
        let mut session = handle.lock().await;
        orchestrator.set_session_api_key(&mut session, api_key);

        Ok(json!({
            "stored": session.has_session_api_key(),
            "used": !orchestrator.has_configured_api_key() && session.has_session_api_key(),
        }))
    }
}

#[derive(Debug)]
pub struct GenerateSopHandler {
    pub store: SessionStore,
}

#[async_trait::async_trait]
impl ToolHandler for GenerateSopHandler {
    async fn execute(&self, args: Value, session_id: Option<&str>) -> Result<Value, String> {
        let notes = str_arg(&args, "notes")?;
        let orchestrator = self.store.orchestrator();

        let handle = self.store.session(session_id).await;
        let mut session = handle.lock().await;
        let markdown = orchestrator
            .generate(&mut session, notes)
            .await
            .map_err(|e| error_value(&e))?
            .to_string();

        Ok(json!({
            "markdown": markdown,
            "usage_count": session.usage_count(),
            "remaining_quota": orchestrator.remaining_quota(&session),
        }))
    }
}

#[derive(Debug)]
pub struct GetSopHandler {
    pub store: SessionStore,
}

#[async_trait::async_trait]
impl ToolHandler for GetSopHandler {
    async fn execute(&self, _args: Value, session_id: Option<&str>) -> Result<Value, String> {
        let orchestrator = self.store.orchestrator();
        let handle = self.store.session(session_id).await;
        let session = handle.lock().await;

        let markdown = orchestrator
            .preview(&session)
            .ok_or_else(|| error_value(&OrchestratorError::NoResult))?;
        let document = orchestrator.formatted(&session).map_err(|e| error_value(&e))?;

        Ok(json!({
            "markdown": markdown,
            "blocks": document.blocks(),
        }))
    }
}

#[derive(Debug)]
pub struct ExportDocxHandler {
    pub store: SessionStore,
}

#[async_trait::async_trait]
impl ToolHandler for ExportDocxHandler {
    async fn execute(&self, _args: Value, session_id: Option<&str>) -> Result<Value, String> {
        let handle = self.store.session(session_id).await;
        let session = handle.lock().await;
        let artifact = self
            .store
            .orchestrator()
            .export_docx(&session)
            .map_err(|e| error_value(&e))?;

        tracing::info!(bytes = artifact.len(), "exported docx");

        Ok(json!({
            "filename": artifact.filename,
            "mime_type": artifact.mime_type,
            "size_bytes": artifact.len(),
            "data_base64": BASE64.encode(&artifact.bytes),
        }))
    }
}

#[derive(Debug)]
pub struct SessionStatusHandler {
    pub store: SessionStore,
}

#[async_trait::async_trait]
impl ToolHandler for SessionStatusHandler {
    async fn execute(&self, _args: Value, session_id: Option<&str>) -> Result<Value, String> {
        let handle = self.store.session(session_id).await;
        let session = handle.lock().await;
        Ok(status_value(self.store.orchestrator(), &session))
    }
}
