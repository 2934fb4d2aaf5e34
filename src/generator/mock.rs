//! Mock generator for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::generator::{GenerationError, Generator};

/// A mock generator that returns a predefined response and counts calls.
#[derive(Debug, Default)]
pub struct MockGenerator {
    response: Mutex<Option<Result<String, String>>>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    /// Create a mock that echoes a fixed SOP.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that always succeeds with `text`.
    pub fn with_response(text: &str) -> Self {
        let mock = Self::new();
        mock.set_response(text);
        mock
    }

    /// Set the text to return.
    pub fn set_response(&self, text: &str) {
        let mut guard = self.response.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Ok(text.to_string()));
    }

    /// Make the next calls fail with an upstream error.
    pub fn set_error(&self, message: &str) {
        let mut guard = self.response.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Err(message.to_string()));
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt passed to the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn id(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, prompt: &str, _api_key: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap_or_else(|e| e.into_inner()) = Some(prompt.to_string());

        let guard = self.response.lock().unwrap_or_else(|e| e.into_inner());
        match &*guard {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(GenerationError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(sample_sop().to_string()),
        }
    }
}

/// Small SOP in the shape the real model produces.
pub fn sample_sop() -> &'static str {
    "## 目標 (Objective)\n確保每週報告準時完成。\n### 詳細執行步驟 (Procedure)\n1. **收集資料**\n2. 開會確認\n- 注意截止時間\n"
}
