//! Mock compiler and repair requester for testing.
//!
//! Both capture their calls and replay predefined responses, so the
//! orchestrator's retry behavior can be verified without a real toolchain
//! or model endpoint.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs;

use forge_pages::BUNDLE_FILE;

use crate::compiler::{CompileJob, CompileOutput, Compiler};
use crate::diagnostics::BuildDiagnostic;
use crate::error::{BuildError, BuildResult};
use crate::repair::RepairRequester;
use crate::workspace::{COMPONENT_FILE, ENTRY_FILE};

/// Predefined mock response for a compile call.
#[derive(Debug, Clone)]
pub struct MockCompileResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl MockCompileResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 100,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 100,
        }
    }
}

/// Captured compile call, including the staged files as they existed at
/// call time (the orchestrator removes them right after).
#[derive(Debug, Clone)]
pub struct CapturedCompile {
    pub page_id: String,
    pub workspace: PathBuf,
    pub staged_source: Option<String>,
    pub staged_entry: Option<String>,
    pub staged_config: Option<String>,
}

/// Mock [`Compiler`] that replays predefined responses and writes a stub
/// bundle for successful ones.
#[derive(Clone)]
pub struct MockCompiler {
    responses: Arc<RwLock<Vec<MockCompileResponse>>>,
    response_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCompile>>>,
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompiler {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a response for the next compile call.
    pub fn add_response(self, response: MockCompileResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple responses.
    pub fn with_responses(self, responses: Vec<MockCompileResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Make compile calls fail as if the process could not run.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCompile> {
        self.captured_calls.read().clone()
    }

    /// Get the number of compile calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    fn next_response(&self) -> MockCompileResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockCompileResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockCompileResponse::success(""))
    }
}

#[async_trait]
impl Compiler for MockCompiler {
    async fn compile(&self, job: &CompileJob) -> BuildResult<CompileOutput> {
        let src = job.workspace.join("src");
        let captured = CapturedCompile {
            page_id: job.page_id.clone(),
            workspace: job.workspace.clone(),
            staged_source: fs::read_to_string(src.join(COMPONENT_FILE)).await.ok(),
            staged_entry: fs::read_to_string(src.join(ENTRY_FILE)).await.ok(),
            staged_config: fs::read_to_string(&job.config_file).await.ok(),
        };
        self.captured_calls.write().push(captured);

        if let Some(message) = self.simulate_failure.read().clone() {
            return Err(BuildError::Compiler(message));
        }

        let response = self.next_response();
        if response.exit_code == 0 {
            fs::create_dir_all(&job.output_dir).await?;
            fs::write(
                job.output_dir.join(BUNDLE_FILE),
                format!("// bundle for {}\n", job.page_id),
            )
            .await?;
        }

        Ok(CompileOutput {
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            duration_ms: response.duration_ms,
        })
    }
}

/// Captured repair call for verification.
#[derive(Debug, Clone)]
pub struct CapturedRepair {
    pub page_id: String,
    pub source: String,
    pub kind_label: String,
    pub attempt: u32,
}

/// Mock [`RepairRequester`] that replays predefined replacement sources.
#[derive(Clone)]
pub struct MockRepairer {
    responses: Arc<RwLock<Vec<Result<String, String>>>>,
    response_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedRepair>>>,
}

impl Default for MockRepairer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRepairer {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue a replacement source.
    pub fn with_response(self, source: impl Into<String>) -> Self {
        self.responses.write().push(Ok(source.into()));
        self
    }

    /// Queue a repair failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.responses.write().push(Err(message.into()));
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedRepair> {
        self.captured_calls.read().clone()
    }

    /// Get the number of repair calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }
}

#[async_trait]
impl RepairRequester for MockRepairer {
    async fn request_repair(
        &self,
        page_id: &str,
        source: &str,
        diagnostic: &BuildDiagnostic,
        attempt: u32,
    ) -> BuildResult<String> {
        self.captured_calls.write().push(CapturedRepair {
            page_id: page_id.to_string(),
            source: source.to_string(),
            kind_label: diagnostic.kind.label().to_string(),
            attempt,
        });

        let responses = self.responses.read();
        if responses.is_empty() {
            return Ok(format!("// repaired\n{source}"));
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        match responses.get(index % responses.len()) {
            Some(Ok(replacement)) => Ok(replacement.clone()),
            Some(Err(message)) => Err(BuildError::Compiler(message.clone())),
            None => Ok(format!("// repaired\n{source}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_mock_compiler_writes_bundle_on_success() {
        let dir = tempdir().unwrap();
        let compiler = MockCompiler::new().add_response(MockCompileResponse::success("done"));

        let job = CompileJob {
            workspace: dir.path().to_path_buf(),
            config_file: dir.path().join("build.config.js"),
            output_dir: dir.path().join("out"),
            page_id: "page-1".to_string(),
        };
        let output = compiler.compile(&job).await.unwrap();

        assert!(output.success());
        assert!(job.output_dir.join(BUNDLE_FILE).exists());
        assert_eq!(compiler.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_compiler_captures_staged_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).await.unwrap();
        fs::write(dir.path().join("src").join("index.tsx"), "the source")
            .await
            .unwrap();

        let compiler = MockCompiler::new();
        let job = CompileJob {
            workspace: dir.path().to_path_buf(),
            config_file: dir.path().join("build.config.js"),
            output_dir: dir.path().join("out"),
            page_id: "page-1".to_string(),
        };
        let _ = compiler.compile(&job).await.unwrap();

        let calls = compiler.get_calls();
        assert_eq!(calls[0].staged_source.as_deref(), Some("the source"));
        assert!(calls[0].staged_entry.is_none());
    }

    #[tokio::test]
    async fn test_mock_repairer_replays_and_captures() {
        let repairer = MockRepairer::new().with_response("fixed");
        let diagnostic = crate::diagnostics::classify("SyntaxError: x");

        let fixed = repairer
            .request_repair("page-1", "broken", &diagnostic, 2)
            .await
            .unwrap();
        assert_eq!(fixed, "fixed");

        let calls = repairer.get_calls();
        assert_eq!(calls[0].attempt, 2);
        assert_eq!(calls[0].kind_label, "syntax");
    }
}
