//! Google Gemini backend (Generative Language API, `generateContent`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{GenerationError, Generator};
use crate::utils::HttpClient;

/// Public API endpoint, without trailing slash
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini generation backend
///
/// Sends a single `generateContent` request per call. The API key travels in
/// the `x-goog-api-key` header so it never appears in URLs or logs.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    http: HttpClient,
    base_url: String,
    model: String,
}

impl GeminiGenerator {
    /// Create a generator against the public endpoint with the default model
    pub fn new(http: HttpClient) -> Self {
        Self::with_endpoint(http, DEFAULT_BASE_URL, DEFAULT_MODEL)
    }

    /// Create a generator for a custom endpoint and model
    pub fn with_endpoint(http: HttpClient, base_url: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn endpoint(&self) -> Result<url::Url, GenerationError> {
        let raw = format!("{}/models/{}:generateContent", self.base_url, self.model);
        url::Url::parse(&raw).map_err(|e| GenerationError::Config(format!("{raw}: {e}")))
    }

    /// Concatenate the text parts of the first candidate
    fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            GenerationError::EmptyResponse(reason)
        })?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "candidate has no text".to_string());
            return Err(GenerationError::EmptyResponse(reason));
        }
        Ok(text)
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn id(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, api_key: &str) -> Result<String, GenerationError> {
        let url = self.endpoint()?;
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.chars().count(), "calling Gemini");

        let response = self
            .http
            .client()
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)?;
        Self::extract_text(parsed)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
