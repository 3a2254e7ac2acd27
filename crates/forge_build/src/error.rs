//! Error types for the build pipeline.

use thiserror::Error;

use crate::diagnostics::{user_message, BuildDiagnostic};

#[derive(Error, Debug)]
pub enum BuildError {
    /// Terminal build failure, raised once the repair budget is exhausted.
    /// Displays as the user-facing message for the final diagnostic.
    #[error("{}", user_message(diagnostic))]
    Failed { diagnostic: BuildDiagnostic },

    /// The compiler process could not run at all (spawn failure, timeout).
    #[error("Compiler process error: {0}")]
    Compiler(String),

    /// Workspace staging or artifact I/O failed.
    #[error("Build I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The repair model failed.
    #[error("Repair model error: {0}")]
    Model(#[from] forge_model::ModelError),
}

pub type BuildResult<T> = Result<T, BuildError>;
