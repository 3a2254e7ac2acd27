//! Error types for model interactions.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("No model endpoint configured")]
    NotConfigured,

    #[error("Model returned an empty completion")]
    EmptyCompletion,

    #[error("Model endpoint error: {0}")]
    Endpoint(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
