//! # SOP Master
//!
//! Turns unstructured notes into a Standard Operating Procedure with a
//! language model, then renders the result as a Word (`.docx`) document.
//!
//! ## Architecture
//!
//! - [`formatter`]: line classifier from model Markdown to document blocks
//! - [`docx`]: in-memory Office Open XML package writer
//! - [`generator`]: generation backends (Gemini, mock) and the fixed prompt
//! - [`orchestrator`]: access gate, per-session quota, credential resolution
//! - [`mcp`]: MCP protocol server exposing one session as tools
//! - [`models`]: document blocks and session state
//! - [`config`]: configuration management
//! - [`ui`], [`utils`]: terminal output and HTTP client

pub mod config;
pub mod docx;
pub mod formatter;
pub mod generator;
pub mod mcp;
pub mod models;
pub mod orchestrator;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use formatter::{classify_line, format_document};
pub use models::{Block, FormattedDocument, SessionContext};
pub use orchestrator::{Orchestrator, OrchestratorError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
