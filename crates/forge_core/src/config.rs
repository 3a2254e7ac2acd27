//! Generation settings, resolved once at composition time.

use forge_build::DEFAULT_MAX_REPAIRS;
use forge_model::ModelChoice;

/// Construction-time settings for the coordinator.
///
/// Requests that do not name a model choice use `default_model_choice`;
/// `max_repairs` is handed to the build orchestrator by whoever wires the
/// two together. Neither is read from the environment here.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub default_model_choice: ModelChoice,
    pub max_repairs: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_model_choice: ModelChoice::Primary,
            max_repairs: DEFAULT_MAX_REPAIRS,
        }
    }
}
