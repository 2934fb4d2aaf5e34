//! Text generation backends.
//!
//! This module defines the [`Generator`] trait that turns a prompt into a
//! Markdown SOP. [`GeminiGenerator`] talks to the Google Generative Language
//! API; [`MockGenerator`] returns canned responses for tests.
//!
//! # Implementing a New Backend
//!
//! 1. Create a struct that implements `Generator`
//! 2. Make exactly one upstream request per `generate` call (no retries)
//! 3. Map every failure to a [`GenerationError`] variant

mod gemini;
pub mod mock;
mod prompt;

pub use gemini::{GeminiGenerator, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use mock::MockGenerator;
pub use prompt::{build_prompt, SYSTEM_PROMPT};

use async_trait::async_trait;

/// A service that completes a prompt into text.
#[async_trait]
pub trait Generator: Send + Sync + std::fmt::Debug {
    /// Identifier used in logs (e.g. "gemini")
    fn id(&self) -> &str;

    /// Model name sent upstream
    fn model(&self) -> &str;

    /// Complete `prompt` using `api_key`. One request, no retry.
    async fn generate(&self, prompt: &str, api_key: &str) -> Result<String, GenerationError>;
}

/// Errors that can occur when calling a generation service
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The model returned no text (e.g. the prompt was blocked)
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Backend is misconfigured
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GenerationError::Api {
            status: 403,
            message: "API key not valid".into(),
        };
        assert_eq!(err.to_string(), "API error (403): API key not valid");

        let err: GenerationError =
            serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, GenerationError::Parse(_)));
    }
}
