//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::session_tools::{
    ExportDocxHandler, GenerateSopHandler, GetSopHandler, SessionStatusHandler,
    SessionStore, SetApiKeyHandler, UnlockHandler,
};

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "generate_sop")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments on behalf of a transport
    /// session (`None` for stdio)
    async fn execute(&self, args: Value, session_id: Option<&str>) -> Result<Value, String>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry whose tools operate on the sessions in `store`
    pub fn for_store(store: SessionStore) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };
        registry.register_session_tools(&store);
        registry
    }

    fn register_session_tools(&mut self, store: &SessionStore) {
        let gated = store.orchestrator().is_gated();

        self.register(Tool {
            name: "unlock".to_string(),
            description: if gated {
                "Unlock SOP generation for this session with the access password.".to_string()
            } else {
                "Unlock SOP generation (no password is configured, so any value works).".to_string()
            },
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "password": {
                        "type": "string",
                        "description": "Access password"
                    }
                },
                "required": ["password"]
            }),
            handler: Arc::new(UnlockHandler {
                store: store.clone(),
            }),
        });

        self.register(Tool {
            name: "set_api_key".to_string(),
            description: "Provide a Gemini API key for this session only. Ignored when the server has a configured key.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "api_key": {
                        "type": "string",
                        "description": "Gemini API key (kept in memory for this session, never stored)"
                    }
                },
                "required": ["api_key"]
            }),
            handler: Arc::new(SetApiKeyHandler {
                store: store.clone(),
            }),
        });

        self.register(Tool {
            name: "generate_sop".to_string(),
            description: "Turn meeting notes, transcripts or rough notes into a structured Standard Operating Procedure in Markdown.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "notes": {
                        "type": "string",
                        "description": "Raw notes to organise into an SOP"
                    }
                },
                "required": ["notes"]
            }),
            handler: Arc::new(GenerateSopHandler {
                store: store.clone(),
            }),
        });

        self.register(Tool {
            name: "get_sop".to_string(),
            description: "Return the Markdown of the last generated SOP in this session.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(GetSopHandler {
                store: store.clone(),
            }),
        });

        self.register(Tool {
            name: "export_docx".to_string(),
            description: "Export the last generated SOP as a Word document (base64-encoded .docx).".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(ExportDocxHandler {
                store: store.clone(),
            }),
        });

        self.register(Tool {
            name: "session_status".to_string(),
            description: "Show whether the session is unlocked and how many generations remain.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(SessionStatusHandler {
                store: store.clone(),
            }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name within a transport session
    pub async fn execute(
        &self,
        name: &str,
        args: Value,
        session_id: Option<&str>,
    ) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args, session_id).await
    }
}
