//! Model integration for PageForge.
//!
//! One trait, [`ModelClient`], covers the three model interactions the
//! pipeline needs: generating component source for a page, generating a
//! short page title, and repairing source that failed to compile. The
//! production implementation, [`HttpModelClient`], speaks the
//! OpenAI-compatible chat completion protocol against an explicit
//! [`ModelConfig`] (a hosted primary endpoint, an optional local one, or
//! neither).
//!
//! Page and title generation never hard-fail on endpoint trouble: they
//! degrade to [`FallbackGenerator`], which renders deterministic component
//! source offline. Repair is the exception; there is no deterministic fix
//! for broken source, so repair errors propagate.

pub mod client;
pub mod error;
pub mod fallback;
pub mod markdown;
pub mod mock;
mod prompt;

pub use client::{
    EndpointConfig, GenerationContext, HttpModelClient, ModelChoice, ModelClient, ModelConfig,
};
pub use error::{ModelError, ModelResult};
pub use fallback::{fallback_title, FallbackGenerator};
pub use mock::MockModel;
