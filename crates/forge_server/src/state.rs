use std::sync::Arc;

use forge_core::GenerationCoordinator;
use forge_events::EventHub;
use forge_model::ModelClient;
use forge_pages::PageStore;

/// State shared by every handler. Cloned per request; all fields are
/// internally shared so clones stay cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: PageStore,
    pub hub: EventHub,
    pub model: Arc<dyn ModelClient>,
    pub coordinator: Arc<GenerationCoordinator>,
}
