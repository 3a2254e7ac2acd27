//! Errors that abort a generation job.

use thiserror::Error;

/// Failure inside the generation pipeline. Build failures are handled in
/// place and never show up here.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Page(#[from] forge_pages::PageError),

    #[error(transparent)]
    Model(#[from] forge_model::ModelError),
}

pub type GenerationResult<T> = Result<T, GenerationError>;
