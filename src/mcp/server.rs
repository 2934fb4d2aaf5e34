//! MCP server implementation using pmcp (Pragmatic AI's rust-mcp-sdk).
//!
//! Each MCP transport session gets its own [`SessionContext`]: the stdio
//! client is one session, and every HTTP client is keyed by its session id.
//!
//! [`SessionContext`]: crate::models::SessionContext

use crate::mcp::session_tools::SessionStore;
use crate::mcp::tools::ToolRegistry;
use crate::orchestrator::Orchestrator;
use async_trait::async_trait;
use pmcp::{
    server::streamable_http_server::StreamableHttpServer, Error, RequestHandlerExtra, Server,
    ServerCapabilities, ToolHandler, ToolInfo,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// The MCP server for SOP Master
#[derive(Debug, Clone)]
pub struct McpServer {
    server: Arc<Mutex<Server>>,
    store: SessionStore,
}

impl McpServer {
    /// Create a new MCP server whose sessions are served by `orchestrator`
    pub fn new(orchestrator: Arc<Orchestrator>) -> Result<Self, pmcp::Error> {
        let store = SessionStore::new(orchestrator);
        let tools = ToolRegistry::for_store(store.clone());
        let server = Self::build_server_impl(tools)?;
        Ok(Self {
            server: Arc::new(Mutex::new(server)),
            store,
        })
    }

    /// Per-client session state
    pub fn sessions(&self) -> &SessionStore {
        &self.store
    }

    fn build_server_impl(tools: ToolRegistry) -> Result<Server, pmcp::Error> {
        let mut builder = Server::builder()
            .name("sop-master")
            .version(env!("CARGO_PKG_VERSION"))
            .capabilities(ServerCapabilities::default());

        for tool in tools.all() {
            let tool_handler = ToolWrapper {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                input_schema: tool.input_schema.clone(),
                handler: tool.handler.clone(),
            };
            builder = builder.tool(tool_handler.name.clone(), tool_handler);
        }

        builder.build()
    }

    /// Run the server in stdio mode (for Claude Desktop and other MCP clients)
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!("Starting MCP server in stdio mode");

        // run_stdio() takes ownership of the Server
        let server = Arc::try_unwrap(self.server)
            .map_err(|_| Error::internal("Cannot unwrap Arc - multiple references exist"))?
            .into_inner();

        server.run_stdio().await
    }

    /// Run the server in streamable HTTP mode
    pub async fn run_http(&self, addr: &str) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        tracing::info!("Starting MCP server in HTTP mode on {}", addr);

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::invalid_params(format!("Invalid address: {}", e)))?;

        StreamableHttpServer::new(socket_addr, self.server.clone())
            .start()
            .await
    }
}

/// Wrapper for adapting our Tool to pmcp's ToolHandler
#[derive(Clone)]
struct ToolWrapper {
    name: String,
    description: Option<String>,
    input_schema: Value,
    handler: Arc<dyn crate::mcp::tools::ToolHandler>,
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, extra: RequestHandlerExtra) -> Result<Value, Error> {
        self.handler
            .execute(args, extra.session_id.as_deref())
            .await
            .map_err(|e| Error::internal(&e))
    }

    fn metadata(&self) -> Option<ToolInfo> {
        Some(ToolInfo::new(
            self.name.clone(),
            self.description.clone(),
            self.input_schema.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockGenerator;
    use crate::orchestrator::AccessPolicy;

    #[tokio::test]
    async fn test_server_starts_without_sessions() {
        let orchestrator = Orchestrator::new(
            Arc::new(MockGenerator::new()),
            AccessPolicy::default(),
            None,
        );
        let server = McpServer::new(Arc::new(orchestrator)).unwrap();
        assert!(server.sessions().is_empty().await);
        assert!(server.sessions().snapshot(None).await.is_none());
    }
}
