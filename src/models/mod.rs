//! Core data models for generated documents and interactive sessions.

mod document;
mod session;

pub use document::{Block, FormattedDocument, LineKind, DEFAULT_TITLE};
pub use session::SessionContext;
