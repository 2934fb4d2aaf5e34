//! Per-session state shared between generation and export.

use chrono::{DateTime, Utc};

/// State owned by one interactive session.
///
/// A session starts locked only if the orchestrator has an access password;
/// [`crate::orchestrator::Orchestrator::new_session`] sets that up. The usage
/// counter and cached result only change through a successful generation.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub(crate) usage_count: u32,
    pub(crate) result: Option<String>,
    pub(crate) unlocked: bool,
    pub(crate) api_key: Option<String>,
    started_at: DateTime<Utc>,
}

impl SessionContext {
    /// Fresh session: zero usage, no result, locked
    pub fn new() -> Self {
        Self {
            usage_count: 0,
            result: None,
            unlocked: false,
            api_key: None,
            started_at: Utc::now(),
        }
    }

    /// Successful generations so far
    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }

    /// Last generated Markdown, if any
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Whether the access gate has been passed
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Whether a credential was supplied for this session only
    pub fn has_session_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// When the session was opened
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub(crate) fn record_success(&mut self, markdown: String) {
        self.result = Some(markdown);
        self.usage_count += 1;
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = SessionContext::new();
        assert_eq!(session.usage_count(), 0);
        assert!(session.result().is_none());
        assert!(!session.is_unlocked());
        assert!(!session.has_session_api_key());
    }

    #[test]
    fn test_record_success_replaces_result() {
        let mut session = SessionContext::new();
        session.record_success("## first".to_string());
        session.record_success("## second".to_string());
        assert_eq!(session.usage_count(), 2);
        assert_eq!(session.result(), Some("## second"));
    }
}
