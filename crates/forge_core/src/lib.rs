//! Generation coordination for PageForge.
//!
//! Ties the page store, model client, build pipeline and event hub into
//! one background job per generation request. Callers hand a request to
//! [`GenerationCoordinator::spawn_generation`] and watch the page's event
//! channel for progress; nothing here blocks the caller.

pub mod config;
pub mod coordinator;
pub mod error;

pub use config::GeneratorConfig;
pub use coordinator::{GenerationCoordinator, GenerationRequest};
pub use error::{GenerationError, GenerationResult};
