//! MCP (Model Context Protocol) implementation.

pub mod server;
mod session_tools;
mod tools;

pub use server::McpServer;
pub use session_tools::SessionStore;
pub use tools::{Tool, ToolHandler, ToolRegistry};
