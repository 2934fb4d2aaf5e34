//! Request orchestration: access gate, quota, credential resolution, one
//! generation call, and export of the cached result.
//!
//! All state lives in a caller-owned [`SessionContext`]. The orchestrator
//! itself only holds configuration and the generation backend, so one
//! instance can serve any number of sessions.
//!
//! ```rust
//! # use std::sync::Arc;
//! # use sop_master::generator::MockGenerator;
//! # use sop_master::orchestrator::{AccessPolicy, Orchestrator, OrchestratorError};
//! # #[tokio::main]
//! # async fn main() {
//! let generator = Arc::new(MockGenerator::with_response("## Goal\n- step"));
//! let policy = AccessPolicy { max_usage: Some(1), ..AccessPolicy::default() };
//! let orchestrator = Orchestrator::new(generator, policy, Some("key".into()));
//!
//! let mut session = orchestrator.new_session();
//! orchestrator.generate(&mut session, "notes").await.unwrap();
//! let err = orchestrator.generate(&mut session, "notes").await.unwrap_err();
//! assert!(matches!(err, OrchestratorError::QuotaExceeded { limit: 1 }));
//! # }
//! ```

mod error;

pub use error::OrchestratorError;

use std::sync::Arc;

use crate::config::Config;
use crate::docx::{render_docx, DocxArtifact};
use crate::formatter::format_document_with_title;
use crate::generator::{build_prompt, Generator};
use crate::models::{FormattedDocument, SessionContext, DEFAULT_TITLE};

/// Gate and quota settings
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    /// Shared secret; `None` leaves the gate open
    pub password: Option<String>,
    /// Successful generations per session; `None` is unlimited
    pub max_usage: Option<u32>,
    /// Remediation link shown on a failed password check
    pub purchase_link: Option<String>,
    /// Title heading of exported documents
    pub title: String,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            password: None,
            max_usage: None,
            purchase_link: None,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl From<&Config> for AccessPolicy {
    fn from(config: &Config) -> Self {
        Self {
            password: config.access.password.clone(),
            max_usage: config.max_usage(),
            purchase_link: config.access.purchase_link.clone(),
            title: config.document.title.clone(),
        }
    }
}

/// Coordinates the generation pipeline for sessions
#[derive(Debug, Clone)]
pub struct Orchestrator {
    generator: Arc<dyn Generator>,
    policy: AccessPolicy,
    configured_api_key: Option<String>,
}

impl Orchestrator {
    /// `configured_api_key` is the pre-configured secret; it always wins over
    /// a credential supplied during a session.
    pub fn new(
        generator: Arc<dyn Generator>,
        policy: AccessPolicy,
        configured_api_key: Option<String>,
    ) -> Self {
        Self {
            generator,
            policy,
            configured_api_key: configured_api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Whether a password must be entered before generating
    pub fn is_gated(&self) -> bool {
        self.policy.password.is_some()
    }

    /// Whether a credential is configured outside any session
    pub fn has_configured_api_key(&self) -> bool {
        self.configured_api_key.is_some()
    }

    /// A fresh session, already unlocked when no password is configured
    pub fn new_session(&self) -> SessionContext {
        let mut session = SessionContext::new();
        session.unlocked = !self.is_gated();
        session
    }

    /// Check `password` against the configured secret.
    ///
    /// Exact byte equality: no trimming, no case folding. A failed attempt
    /// re-locks the session.
    pub fn unlock(
        &self,
        session: &mut SessionContext,
        password: &str,
    ) -> Result<(), OrchestratorError> {
        match &self.policy.password {
            None => {
                session.unlocked = true;
                Ok(())
            }
            Some(secret) if secret == password => {
                tracing::info!("session unlocked");
                session.unlocked = true;
                Ok(())
            }
            Some(_) => {
                tracing::warn!("rejected access password");
                session.unlocked = false;
                Err(OrchestratorError::AuthenticationFailed {
                    purchase_link: self.policy.purchase_link.clone(),
                })
            }
        }
    }

    /// Remember a credential for this session only. Empty input clears it.
    pub fn set_session_api_key(&self, session: &mut SessionContext, api_key: &str) {
        let trimmed = api_key.trim();
        session.api_key = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    /// Configured secret first, then the session credential
    pub fn resolve_api_key<'a>(
        &'a self,
        session: &'a SessionContext,
    ) -> Result<&'a str, OrchestratorError> {
        self.configured_api_key
            .as_deref()
            .or(session.api_key.as_deref())
            .ok_or(OrchestratorError::MissingCredential)
    }

    /// Generations left in this session, `None` when unlimited
    pub fn remaining_quota(&self, session: &SessionContext) -> Option<u32> {
        self.policy
            .max_usage
            .map(|max| max.saturating_sub(session.usage_count))
    }

    /// Run one generation for `raw` notes.
    ///
    /// Checks run in order: gate, empty input, quota, credential. Only then is
    /// the backend called, exactly once. On failure the session is left as
    /// it was; on success the result replaces the previous one and the usage
    /// counter goes up by one.
    pub async fn generate<'s>(
        &self,
        session: &'s mut SessionContext,
        raw: &str,
    ) -> Result<&'s str, OrchestratorError> {
        if !session.unlocked {
            return Err(OrchestratorError::AuthenticationFailed {
                purchase_link: self.policy.purchase_link.clone(),
            });
        }

        if raw.trim().is_empty() {
            return Err(OrchestratorError::EmptyInput);
        }

        if let Some(limit) = self.policy.max_usage {
            if session.usage_count >= limit {
                tracing::warn!(limit, "session quota exhausted");
                return Err(OrchestratorError::QuotaExceeded { limit });
            }
        }

        let api_key = self.resolve_api_key(session)?.to_string();
        let prompt = build_prompt(raw);

        tracing::info!(
            backend = self.generator.id(),
            model = self.generator.model(),
            "generating SOP"
        );

        let markdown = self
            .generator
            .generate(&prompt, &api_key)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "generation failed");
                OrchestratorError::UpstreamGenerationError(e)
            })?;

        session.record_success(markdown);
        tracing::info!(usage = session.usage_count, "SOP generated");

        Ok(session.result.as_deref().unwrap_or_default())
    }

    /// Cached Markdown of the last successful generation
    pub fn preview<'s>(&self, session: &'s SessionContext) -> Option<&'s str> {
        session.result()
    }

    /// Rebuild the block structure from the cached result
    pub fn formatted(&self, session: &SessionContext) -> Result<FormattedDocument, OrchestratorError> {
        let markdown = session.result().ok_or(OrchestratorError::NoResult)?;
        Ok(format_document_with_title(markdown, &self.policy.title))
    }

    /// Render the cached result as a `.docx` artifact. Rebuilt on every call.
    pub fn export_docx(&self, session: &SessionContext) -> Result<DocxArtifact, OrchestratorError> {
        let doc = self.formatted(session)?;
        let bytes = render_docx(&doc)?;
        Ok(DocxArtifact::new(bytes))
    }
}
