//! Background generation jobs.
//!
//! `spawn_generation` accepts a request and returns immediately; the work
//! runs as a detached task and every outcome, good or bad, is observable
//! only through the event hub. Jobs for different pages run concurrently.
//! Two jobs for the same page are allowed and race; last write wins.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use forge_build::{BuildOrchestrator, BuildRequest};
use forge_events::EventHub;
use forge_model::{fallback_title, GenerationContext, ModelChoice, ModelClient};
use forge_pages::{PageKind, PageStore};

use crate::config::GeneratorConfig;
use crate::error::GenerationResult;

/// One page generation job.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub page_id: String,
    pub page_kind: PageKind,
    /// What the user asked for, verbatim.
    pub prompt: String,
    /// Overrides the configured default when set.
    pub model_choice: Option<ModelChoice>,
}

/// Sequences one generation job: resolve or initialize the page, ask the
/// model for component source, persist it, build it, and broadcast
/// lifecycle events along the way.
#[derive(Clone)]
pub struct GenerationCoordinator {
    store: PageStore,
    hub: EventHub,
    model: Arc<dyn ModelClient>,
    builder: Arc<BuildOrchestrator>,
    config: GeneratorConfig,
}

impl GenerationCoordinator {
    pub fn new(
        store: PageStore,
        hub: EventHub,
        model: Arc<dyn ModelClient>,
        builder: Arc<BuildOrchestrator>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            store,
            hub,
            model,
            builder,
            config,
        }
    }

    /// Start a generation job and return without waiting for it.
    ///
    /// The handle is returned for callers that want to await completion in
    /// tests; the server discards it.
    pub fn spawn_generation(&self, request: GenerationRequest) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.run(request).await;
        })
    }

    /// Job boundary: any error escaping the pipeline becomes exactly one
    /// `error` broadcast and the job ends.
    async fn run(&self, request: GenerationRequest) {
        let page_id = request.page_id.clone();
        info!(page_id = %page_id, kind = %request.page_kind, "Generation job started");

        if let Err(e) = self.run_pipeline(request).await {
            error!(page_id = %page_id, "Page generation failed: {e}");
            self.hub.error(&page_id, e.to_string());
        }
    }

    async fn run_pipeline(&self, request: GenerationRequest) -> GenerationResult<()> {
        let choice = request
            .model_choice
            .unwrap_or(self.config.default_model_choice);

        // A page with no content yet (or none readable) is initialized
        // first, and the seeded template becomes the modification context.
        let current = match self.store.read_content(&request.page_id).await {
            Ok(content) if !content.is_empty() => content,
            Ok(_) | Err(_) => {
                debug!(page_id = %request.page_id, "No existing content, initializing page");
                let title = self.resolve_title(&request, choice).await;
                self.store
                    .initialize_page(&request.page_id, request.page_kind, &title)
                    .await?
            }
        };

        self.hub.generation_start(&request.page_id);

        let context = GenerationContext {
            page_id: request.page_id.clone(),
            page_kind: request.page_kind,
            prompt: request.prompt.clone(),
            current_source: Some(current),
            model_choice: choice,
        };
        let source = self.model.generate_page(&context).await?;
        debug!(
            page_id = %request.page_id,
            source_len = source.len(),
            "Model returned component source"
        );

        self.store
            .write_component_source(&request.page_id, &source)
            .await?;

        // The build is best-effort: a failure is reported to subscribers
        // but the persisted source and the remaining broadcasts stand.
        let build_request = BuildRequest {
            page_id: request.page_id.clone(),
            source: source.clone(),
            output_dir: self.store.page_dir(&request.page_id),
        };
        match self.builder.build(&build_request).await {
            Ok(bundle) => {
                info!(page_id = %request.page_id, bundle = %bundle.display(), "Component built");
            }
            Err(e) => {
                warn!(page_id = %request.page_id, "Component build failed: {e}");
                self.hub
                    .error(&request.page_id, format!("Component build failed: {e}"));
            }
        }

        self.hub.page_update(&request.page_id, &source);
        self.hub.generation_complete(&request.page_id);
        info!(page_id = %request.page_id, "Generation job finished");
        Ok(())
    }

    /// Title for a page being initialized. Model failures and empty
    /// completions fall back to the deterministic keyword title.
    async fn resolve_title(&self, request: &GenerationRequest, choice: ModelChoice) -> String {
        match self
            .model
            .generate_title(&request.prompt, request.page_kind, choice)
            .await
        {
            Ok(title) if !title.trim().is_empty() => title,
            Ok(_) => fallback_title(&request.prompt, request.page_kind),
            Err(e) => {
                warn!(page_id = %request.page_id, "Title generation failed, using fallback: {e}");
                fallback_title(&request.prompt, request.page_kind)
            }
        }
    }
}
