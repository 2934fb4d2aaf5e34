use crate::docx::DocxError;
use crate::generator::GenerationError;

/// Why a request was refused or failed. None of these end the session.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// No configured secret and no credential supplied for the session
    #[error("No API key configured")]
    MissingCredential,

    /// Session already used its allowance
    #[error("Usage limit of {limit} generations reached for this session")]
    QuotaExceeded { limit: u32 },

    /// Access password missing or wrong
    #[error("Access password required")]
    AuthenticationFailed { purchase_link: Option<String> },

    /// The generation service call failed
    #[error("Generation failed: {0}")]
    UpstreamGenerationError(#[from] GenerationError),

    /// Notes were empty or whitespace only
    #[error("Input is empty")]
    EmptyInput,

    /// Export requested before any successful generation
    #[error("No generated document in this session")]
    NoResult,

    /// Building the .docx package failed
    #[error("Document rendering failed: {0}")]
    Render(#[from] DocxError),
}

impl OrchestratorError {
    /// Message shown to the person using the tool
    pub fn user_message(&self) -> String {
        match self {
            OrchestratorError::MissingCredential => {
                "System error: no Gemini API key is configured. Set GEMINI_API_KEY or supply a key for this session.".to_string()
            }
            OrchestratorError::QuotaExceeded { limit } => format!(
                "You have reached the usage limit for this session ({limit} generations). Please start a new session and try again later."
            ),
            OrchestratorError::AuthenticationFailed { purchase_link } => match purchase_link {
                Some(link) => format!(
                    "Please enter the access password to unlock this tool. Don't have one yet? Get a pass here: {link}"
                ),
                None => "Please enter the access password to unlock this tool.".to_string(),
            },
            OrchestratorError::UpstreamGenerationError(e) => {
                format!("Generation failed, please try again later. Error: {e}")
            }
            OrchestratorError::EmptyInput => "Please enter some notes first.".to_string(),
            OrchestratorError::NoResult => {
                "Nothing has been generated yet. Submit your notes first.".to_string()
            }
            OrchestratorError::Render(e) => format!("Could not build the Word document: {e}"),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            OrchestratorError::MissingCredential => "missing_credential",
            OrchestratorError::QuotaExceeded { .. } => "quota_exceeded",
            OrchestratorError::AuthenticationFailed { .. } => "authentication_failed",
            OrchestratorError::UpstreamGenerationError(_) => "upstream_generation_error",
            OrchestratorError::EmptyInput => "empty_input",
            OrchestratorError::NoResult => "no_result",
            OrchestratorError::Render(_) => "render_error",
        }
    }
}
