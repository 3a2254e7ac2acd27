//! Compiler adapter.
//!
//! The build pipeline treats the component compiler as an external
//! subprocess behind the [`Compiler`] trait; tests swap in the mock from
//! [`crate::mock`].

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{BuildError, BuildResult};

/// One compiler invocation, fully described.
#[derive(Debug, Clone)]
pub struct CompileJob {
    /// Working directory for the compiler process.
    pub workspace: PathBuf,
    /// Rendered configuration file inside the workspace.
    pub config_file: PathBuf,
    /// Directory the bundle is emitted into.
    pub output_dir: PathBuf,
    pub page_id: String,
}

/// Captured result of a compiler run.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl CompileOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stderr and stdout merged for classification; webpack reports most
    /// failures on stderr but some loaders write to stdout.
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stderr.trim(), self.stdout.trim())
            .trim()
            .to_string()
    }
}

/// External component compiler.
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Run the compiler to completion and capture its output. An `Err`
    /// means the process could not run at all; compile failures come back
    /// as an unsuccessful [`CompileOutput`].
    async fn compile(&self, job: &CompileJob) -> BuildResult<CompileOutput>;
}

/// Runs the real compiler toolchain as a subprocess.
pub struct ProcessCompiler {
    command: Vec<String>,
    timeout: Option<Duration>,
}

impl Default for ProcessCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessCompiler {
    /// Webpack via npx, the stack the page templates target.
    pub fn new() -> Self {
        Self {
            command: vec!["npx".to_string(), "webpack".to_string()],
            timeout: None,
        }
    }

    /// Override the compiler command. `--config <file>` is appended per job.
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    /// Kill the compiler if it runs longer than this.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Compiler for ProcessCompiler {
    async fn compile(&self, job: &CompileJob) -> BuildResult<CompileOutput> {
        let program = self
            .command
            .first()
            .ok_or_else(|| BuildError::Compiler("No compiler command configured".to_string()))?;

        let mut command = Command::new(program);
        command
            .args(&self.command[1..])
            .arg("--config")
            .arg(&job.config_file)
            .current_dir(&job.workspace)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(
            "Running compiler for page {} in {:?}",
            job.page_id, job.workspace
        );
        let started = Instant::now();

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| {
                    BuildError::Compiler(format!(
                        "Compiler timed out after {}s",
                        limit.as_secs()
                    ))
                })?,
            None => command.output().await,
        };
        let output = output
            .map_err(|e| BuildError::Compiler(format!("Could not start compiler: {e}")))?;

        Ok(CompileOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}
