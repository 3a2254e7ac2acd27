//! Component build pipeline.
//!
//! Compiles generated React TypeScript components into standalone UMD
//! bundles. Failed compiles are classified into diagnostics and sent to
//! the model for repair, with a bounded number of retries. Each build
//! runs in its own scratch workspace so concurrent builds never share
//! staged files.

pub mod compiler;
pub mod diagnostics;
pub mod error;
pub mod mock;
pub mod orchestrator;
pub mod repair;
pub mod workspace;

pub use compiler::{CompileJob, CompileOutput, Compiler, ProcessCompiler};
pub use diagnostics::{classify, user_message, BuildDiagnostic, DiagnosticKind, SourceLocation};
pub use error::{BuildError, BuildResult};
pub use mock::{
    CapturedCompile, CapturedRepair, MockCompileResponse, MockCompiler, MockRepairer,
};
pub use orchestrator::{
    BuildConfig, BuildOrchestrator, BuildRequest, DEFAULT_MAX_REPAIRS,
};
pub use repair::{ModelRepairRequester, RepairRequester};
pub use workspace::BuildWorkspace;
