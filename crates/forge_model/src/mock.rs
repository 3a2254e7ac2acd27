//! Mock model client for testing.
//!
//! Captures every call and replays queued completions, so pipeline tests
//! run without any model endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use forge_pages::PageKind;
use parking_lot::RwLock;

use crate::client::{GenerationContext, ModelChoice, ModelClient};
use crate::error::{ModelError, ModelResult};

const DEFAULT_COMPONENT: &str =
    "import React from 'react';\n\nconst App = () => <div>mock page</div>;\n\nexport default App;\n";
const DEFAULT_TITLE: &str = "Mock Title";

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub prompt: String,
    pub page_id: Option<String>,
}

/// Mock [`ModelClient`] that replays predefined completions.
#[derive(Clone)]
pub struct MockModel {
    page_responses: Arc<RwLock<Vec<Result<String, String>>>>,
    page_index: Arc<AtomicUsize>,
    title_responses: Arc<RwLock<Vec<Result<String, String>>>>,
    title_index: Arc<AtomicUsize>,
    repair_responses: Arc<RwLock<Vec<Result<String, String>>>>,
    repair_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            page_responses: Arc::new(RwLock::new(Vec::new())),
            page_index: Arc::new(AtomicUsize::new(0)),
            title_responses: Arc::new(RwLock::new(Vec::new())),
            title_index: Arc::new(AtomicUsize::new(0)),
            repair_responses: Arc::new(RwLock::new(Vec::new())),
            repair_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue a page generation completion.
    pub fn with_page_response(self, content: impl Into<String>) -> Self {
        self.page_responses.write().push(Ok(content.into()));
        self
    }

    /// Queue a page generation failure.
    pub fn with_page_failure(self, message: impl Into<String>) -> Self {
        self.page_responses.write().push(Err(message.into()));
        self
    }

    /// Queue a title completion.
    pub fn with_title_response(self, title: impl Into<String>) -> Self {
        self.title_responses.write().push(Ok(title.into()));
        self
    }

    /// Queue a title failure.
    pub fn with_title_failure(self, message: impl Into<String>) -> Self {
        self.title_responses.write().push(Err(message.into()));
        self
    }

    /// Queue a repair completion.
    pub fn with_repair_response(self, content: impl Into<String>) -> Self {
        self.repair_responses.write().push(Ok(content.into()));
        self
    }

    /// Queue a repair failure.
    pub fn with_repair_failure(self, message: impl Into<String>) -> Self {
        self.repair_responses.write().push(Err(message.into()));
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get calls to a specific method.
    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.method == method)
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    fn next_response(
        queue: &RwLock<Vec<Result<String, String>>>,
        index: &AtomicUsize,
        default: &str,
    ) -> ModelResult<String> {
        let responses = queue.read();
        if responses.is_empty() {
            return Ok(default.to_string());
        }
        let i = index.fetch_add(1, Ordering::SeqCst);
        match responses.get(i % responses.len()) {
            Some(Ok(content)) => Ok(content.clone()),
            Some(Err(message)) => Err(ModelError::Endpoint(message.clone())),
            None => Ok(default.to_string()),
        }
    }
}

#[async_trait]
impl ModelClient for MockModel {
    async fn generate_page(&self, context: &GenerationContext) -> ModelResult<String> {
        self.record_call(CapturedCall {
            method: "generate_page".to_string(),
            prompt: context.prompt.clone(),
            page_id: Some(context.page_id.clone()),
        });
        Self::next_response(&self.page_responses, &self.page_index, DEFAULT_COMPONENT)
    }

    async fn generate_title(
        &self,
        prompt: &str,
        _kind: PageKind,
        _choice: ModelChoice,
    ) -> ModelResult<String> {
        self.record_call(CapturedCall {
            method: "generate_title".to_string(),
            prompt: prompt.to_string(),
            page_id: None,
        });
        Self::next_response(&self.title_responses, &self.title_index, DEFAULT_TITLE)
    }

    async fn repair_source(&self, prompt: &str) -> ModelResult<String> {
        self.record_call(CapturedCall {
            method: "repair_source".to_string(),
            prompt: prompt.to_string(),
            page_id: None,
        });
        Self::next_response(&self.repair_responses, &self.repair_index, DEFAULT_COMPONENT)
    }
}
