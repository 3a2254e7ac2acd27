//! Model client for page generation, titles and code repair.
//!
//! Talks to OpenAI-compatible chat completion endpoints. Two endpoints can
//! be configured: a primary hosted one and a local one (LM Studio or
//! similar). Page and title generation degrade to the deterministic
//! fallback when no endpoint is usable; repair does not, because a broken
//! component has no deterministic fix.

use async_trait::async_trait;
use forge_pages::PageKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ModelError, ModelResult};
use crate::fallback::{self, FallbackGenerator};
use crate::markdown;
use crate::prompt;

const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_TOKENS: u32 = 8000;
const TITLE_MAX_TOKENS: u32 = 100;
const REPAIR_TEMPERATURE: f32 = 0.2;
const REPAIR_MAX_TOKENS: u32 = 4000;

/// Which endpoint a request should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelChoice {
    /// The hosted endpoint, when one is configured.
    #[default]
    Primary,
    /// The local endpoint.
    Local,
}

impl ModelChoice {
    /// Map the wire-level `useLocalModel` flag.
    pub fn from_use_local(use_local: bool) -> Self {
        if use_local {
            Self::Local
        } else {
            Self::Primary
        }
    }
}

/// One chat completion endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Base URL up to but not including `/chat/completions`.
    pub base_url: String,
    /// Bearer token; local endpoints usually run without one.
    pub api_key: Option<String>,
    /// Model identifier passed in each request.
    pub model: String,
}

/// Explicit model configuration. Built once at startup; no environment
/// access happens below this point.
#[derive(Debug, Clone, Default)]
pub struct ModelConfig {
    pub primary: Option<EndpointConfig>,
    pub local: Option<EndpointConfig>,
}

/// Everything a page generation call needs.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub page_id: String,
    pub page_kind: PageKind,
    pub prompt: String,
    /// Existing component source, when the page is being modified rather
    /// than created.
    pub current_source: Option<String>,
    pub model_choice: ModelChoice,
}

/// Interface the generation pipeline programs against.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate complete component source for a page.
    async fn generate_page(&self, context: &GenerationContext) -> ModelResult<String>;

    /// Generate a short page title from the prompt.
    async fn generate_title(
        &self,
        prompt: &str,
        kind: PageKind,
        choice: ModelChoice,
    ) -> ModelResult<String>;

    /// Return corrected source for a prebuilt repair prompt. Empty
    /// completions are an error.
    async fn repair_source(&self, prompt: &str) -> ModelResult<String>;
}

/// [`ModelClient`] over HTTP chat completion endpoints.
pub struct HttpModelClient {
    config: ModelConfig,
    fallback: FallbackGenerator,
    client: reqwest::Client,
}

impl HttpModelClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            fallback: FallbackGenerator::new(),
            client: reqwest::Client::new(),
        }
    }

    /// Endpoint a request routes to: the local one when selected or when no
    /// primary is configured, the primary otherwise. `None` means no usable
    /// endpoint.
    fn routed_endpoint(&self, choice: ModelChoice) -> Option<&EndpointConfig> {
        if choice == ModelChoice::Local || self.config.primary.is_none() {
            self.config.local.as_ref()
        } else {
            self.config.primary.as_ref()
        }
    }

    /// One chat completion call with retries on transient failures
    /// (network errors, 5xx, rate limits). Backoff is 1s, 2s.
    async fn chat(
        &self,
        endpoint: &EndpointConfig,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> ModelResult<String> {
        let url = format!(
            "{}/chat/completions",
            endpoint.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: endpoint.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature,
            max_tokens,
        };

        const MAX_RETRIES: u32 = 3;
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_secs(1 << (attempt - 1));
                tokio::time::sleep(delay).await;
            }

            let mut builder = self.client.post(&url).json(&request);
            if let Some(key) = &endpoint.api_key {
                builder = builder.header("Authorization", format!("Bearer {key}"));
            }

            let response = match builder.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(ModelError::Network(e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() || status.as_u16() == 429 {
                let body = response.text().await.unwrap_or_default();
                last_error = Some(ModelError::Endpoint(format!(
                    "{} {} (attempt {}/{}): {}",
                    endpoint.model,
                    status,
                    attempt + 1,
                    MAX_RETRIES,
                    body
                )));
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ModelError::Endpoint(format!(
                    "{} {}: {}",
                    endpoint.model, status, body
                )));
            }

            let result: ChatResponse = response.json().await.map_err(|e| {
                ModelError::Endpoint(format!("Could not parse completion: {e}"))
            })?;

            return result
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| ModelError::Endpoint("Completion had no choices".to_string()));
        }

        Err(last_error.unwrap_or(ModelError::NotConfigured))
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn generate_page(&self, context: &GenerationContext) -> ModelResult<String> {
        let system = prompt::page_system_prompt(context.page_kind);
        let user = prompt::page_user_prompt(&context.prompt, context.current_source.as_deref());

        match self.routed_endpoint(context.model_choice) {
            Some(endpoint) => {
                debug!(
                    "Generating page {} with model {}",
                    context.page_id, endpoint.model
                );
                match self
                    .chat(
                        endpoint,
                        &system,
                        &user,
                        GENERATION_TEMPERATURE,
                        GENERATION_MAX_TOKENS,
                    )
                    .await
                {
                    Ok(content) => Ok(markdown::strip_code_fences(&content)),
                    Err(e) => {
                        warn!(
                            "Model generation failed for page {}, using fallback: {}",
                            context.page_id, e
                        );
                        Ok(self.fallback.generate_page(context))
                    }
                }
            }
            None => {
                info!(
                    "No model endpoint for page {}, using fallback generation",
                    context.page_id
                );
                Ok(self.fallback.generate_page(context))
            }
        }
    }

    async fn generate_title(
        &self,
        prompt_text: &str,
        kind: PageKind,
        choice: ModelChoice,
    ) -> ModelResult<String> {
        let user = prompt::title_prompt(prompt_text, kind);

        if let Some(endpoint) = self.routed_endpoint(choice) {
            match self
                .chat(
                    endpoint,
                    prompt::TITLE_SYSTEM_PROMPT,
                    &user,
                    GENERATION_TEMPERATURE,
                    TITLE_MAX_TOKENS,
                )
                .await
            {
                Ok(title) if !title.trim().is_empty() => {
                    return Ok(title.trim().to_string());
                }
                Ok(_) => debug!("Model returned an empty title, using fallback"),
                Err(e) => warn!("Title generation failed, using fallback: {}", e),
            }
        }

        Ok(fallback::fallback_title(prompt_text, kind))
    }

    async fn repair_source(&self, prompt_text: &str) -> ModelResult<String> {
        let endpoint = self.config.primary.as_ref().ok_or(ModelError::NotConfigured)?;

        let fixed = self
            .chat(
                endpoint,
                prompt::REPAIR_SYSTEM_PROMPT,
                prompt_text,
                REPAIR_TEMPERATURE,
                REPAIR_MAX_TOKENS,
            )
            .await?;

        if fixed.trim().is_empty() {
            return Err(ModelError::EmptyCompletion);
        }
        Ok(fixed)
    }
}

// OpenAI-compatible API types
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(model: &str) -> EndpointConfig {
        EndpointConfig {
            base_url: "http://localhost:9999/v1".to_string(),
            api_key: None,
            model: model.to_string(),
        }
    }

    #[test]
    fn test_routing_prefers_primary_by_default() {
        let client = HttpModelClient::new(ModelConfig {
            primary: Some(endpoint("hosted")),
            local: Some(endpoint("local")),
        });

        let routed = client.routed_endpoint(ModelChoice::Primary).unwrap();
        assert_eq!(routed.model, "hosted");
    }

    #[test]
    fn test_routing_honors_local_choice() {
        let client = HttpModelClient::new(ModelConfig {
            primary: Some(endpoint("hosted")),
            local: Some(endpoint("local")),
        });

        let routed = client.routed_endpoint(ModelChoice::Local).unwrap();
        assert_eq!(routed.model, "local");
    }

    #[test]
    fn test_routing_without_primary_uses_local() {
        let client = HttpModelClient::new(ModelConfig {
            primary: None,
            local: Some(endpoint("local")),
        });

        let routed = client.routed_endpoint(ModelChoice::Primary).unwrap();
        assert_eq!(routed.model, "local");
    }

    #[test]
    fn test_routing_with_nothing_configured() {
        let client = HttpModelClient::new(ModelConfig::default());
        assert!(client.routed_endpoint(ModelChoice::Primary).is_none());
        assert!(client.routed_endpoint(ModelChoice::Local).is_none());
    }

    #[tokio::test]
    async fn test_generate_page_falls_back_without_endpoints() {
        let client = HttpModelClient::new(ModelConfig::default());
        let context = GenerationContext {
            page_id: "page-1".to_string(),
            page_kind: PageKind::H5,
            prompt: "a news page".to_string(),
            current_source: None,
            model_choice: ModelChoice::Primary,
        };

        let source = client.generate_page(&context).await.unwrap();
        assert!(source.contains("export default App"));
    }

    #[tokio::test]
    async fn test_generate_title_falls_back_without_endpoints() {
        let client = HttpModelClient::new(ModelConfig::default());
        let title = client
            .generate_title("user login screen", PageKind::H5, ModelChoice::Primary)
            .await
            .unwrap();
        assert_eq!(title, "User Login");
    }

    #[tokio::test]
    async fn test_repair_requires_primary_endpoint() {
        let client = HttpModelClient::new(ModelConfig::default());
        let result = client.repair_source("fix this").await;
        assert!(matches!(result, Err(ModelError::NotConfigured)));
    }

    #[test]
    fn test_model_choice_from_wire_flag() {
        assert_eq!(ModelChoice::from_use_local(true), ModelChoice::Local);
        assert_eq!(ModelChoice::from_use_local(false), ModelChoice::Primary);
    }
}
