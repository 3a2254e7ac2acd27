//! Build orchestration with automatic repair rounds.
//!
//! Each build stages the candidate component in an isolated scratch
//! workspace, invokes the compiler, and on failure asks the model for a
//! fixed source before trying again. The workspace is removed on every
//! exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, warn};

use forge_pages::BUNDLE_FILE;

use crate::compiler::{CompileJob, Compiler};
use crate::diagnostics::{classify, BuildDiagnostic};
use crate::error::{BuildError, BuildResult};
use crate::repair::RepairRequester;
use crate::workspace::BuildWorkspace;

/// Repair rounds allowed after the first failed compile.
pub const DEFAULT_MAX_REPAIRS: u32 = 3;

/// A single component build request.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub page_id: String,
    /// Candidate component source, compiled as `src/index.tsx`.
    pub source: String,
    /// Directory the bundle is emitted into. Created if missing.
    pub output_dir: PathBuf,
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Parent directory for per-build scratch workspaces.
    pub scratch_root: PathBuf,
    pub max_repairs: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir().join("pageforge-builds"),
            max_repairs: DEFAULT_MAX_REPAIRS,
        }
    }
}

/// Runs compile attempts and repair rounds for one component.
///
/// Concurrent builds are safe: every call to [`BuildOrchestrator::build`]
/// gets its own workspace, even for the same page.
pub struct BuildOrchestrator {
    compiler: Arc<dyn Compiler>,
    repairer: Arc<dyn RepairRequester>,
    config: BuildConfig,
}

enum AttemptOutcome {
    Built(PathBuf),
    Failed(String),
}

impl BuildOrchestrator {
    pub fn new(compiler: Arc<dyn Compiler>, repairer: Arc<dyn RepairRequester>) -> Self {
        Self::with_config(compiler, repairer, BuildConfig::default())
    }

    pub fn with_config(
        compiler: Arc<dyn Compiler>,
        repairer: Arc<dyn RepairRequester>,
        config: BuildConfig,
    ) -> Self {
        Self {
            compiler,
            repairer,
            config,
        }
    }

    /// Build the component and return the path of the emitted bundle.
    ///
    /// The scratch workspace is removed before returning, whether the build
    /// succeeded or not.
    pub async fn build(&self, request: &BuildRequest) -> BuildResult<PathBuf> {
        fs::create_dir_all(&request.output_dir).await?;
        let workspace = BuildWorkspace::create(&self.config.scratch_root, &request.page_id).await?;

        let result = self.build_with_repairs(request, &workspace).await;
        workspace.cleanup().await;
        result
    }

    async fn build_with_repairs(
        &self,
        request: &BuildRequest,
        workspace: &BuildWorkspace,
    ) -> BuildResult<PathBuf> {
        let mut source = request.source.clone();
        let mut attempt: u32 = 0;

        loop {
            debug!(page_id = %request.page_id, attempt, "Compiling component");
            match self.run_attempt(request, workspace, &source).await? {
                AttemptOutcome::Built(bundle) => {
                    info!(page_id = %request.page_id, attempt, "Component built");
                    return Ok(bundle);
                }
                AttemptOutcome::Failed(raw) => {
                    let diagnostic = classify(&raw);
                    warn!(
                        page_id = %request.page_id,
                        attempt,
                        kind = diagnostic.kind.label(),
                        "Compile failed"
                    );

                    if attempt >= self.config.max_repairs {
                        return Err(BuildError::Failed { diagnostic });
                    }
                    source = self
                        .request_repair(request, &source, diagnostic, attempt)
                        .await?;
                    attempt += 1;
                }
            }
        }
    }

    /// Ask the model for a replacement source. A failed or empty repair is
    /// fatal and carries the diagnostic of the compile it tried to fix.
    async fn request_repair(
        &self,
        request: &BuildRequest,
        source: &str,
        diagnostic: BuildDiagnostic,
        attempt: u32,
    ) -> BuildResult<String> {
        let repaired = match self
            .repairer
            .request_repair(&request.page_id, source, &diagnostic, attempt)
            .await
        {
            Ok(repaired) => repaired,
            Err(e) => {
                warn!(page_id = %request.page_id, attempt, "Repair request failed: {e}");
                return Err(BuildError::Failed { diagnostic });
            }
        };
        if repaired.trim().is_empty() {
            warn!(page_id = %request.page_id, attempt, "Repair returned empty source");
            return Err(BuildError::Failed { diagnostic });
        }
        Ok(repaired)
    }

    async fn run_attempt(
        &self,
        request: &BuildRequest,
        workspace: &BuildWorkspace,
        source: &str,
    ) -> BuildResult<AttemptOutcome> {
        let config = compiler_config(
            &workspace.entry_path(),
            &request.output_dir,
            &request.page_id,
        );
        workspace
            .stage(source, &entry_glue(&request.page_id), &config)
            .await?;

        let job = CompileJob {
            workspace: workspace.root().to_path_buf(),
            config_file: workspace.config_path(),
            output_dir: request.output_dir.clone(),
            page_id: request.page_id.clone(),
        };
        let result = self.compiler.compile(&job).await;
        workspace.release_staged().await;

        match result {
            Ok(output) if output.success() => {
                Ok(AttemptOutcome::Built(request.output_dir.join(BUNDLE_FILE)))
            }
            Ok(output) => Ok(AttemptOutcome::Failed(output.combined_output())),
            // A compiler that could not run at all is handled like a failed
            // compile so its message goes through classification too.
            Err(e) => Ok(AttemptOutcome::Failed(e.to_string())),
        }
    }
}

/// Entry module that re-exports the component and binds it to the global
/// the page shell looks up. Bracket notation keeps any page id valid.
fn entry_glue(page_id: &str) -> String {
    format!(
        "import App from './index'\n\
         //@ts-ignore\n\
         window['PageComponent_{page_id}'] = App\n\
         export default App\n"
    )
}

/// Webpack config staged next to the component. `clean` stays off because
/// the output directory is the page directory and already holds content.
fn compiler_config(entry: &Path, output_dir: &Path, page_id: &str) -> String {
    let entry_path = js_path(entry);
    let output_path = js_path(output_dir);
    let bundle = BUNDLE_FILE;
    format!(
        r#"module.exports = {{
  mode: 'production',
  entry: '{entry_path}',
  output: {{
    path: '{output_path}',
    filename: '{bundle}',
    library: 'PageComponent_{page_id}',
    libraryTarget: 'umd',
    globalObject: 'this',
    clean: false
  }},
  module: {{
    rules: [
      {{
        test: /\.tsx?$/,
        use: {{
          loader: 'ts-loader',
          options: {{
            transpileOnly: true,
            compilerOptions: {{
              target: 'es2017',
              module: 'esnext',
              moduleResolution: 'node',
              jsx: 'react',
              esModuleInterop: true
            }}
          }}
        }},
        exclude: /node_modules/
      }},
      {{
        test: /\.css$/,
        use: ['style-loader', 'css-loader']
      }}
    ]
  }},
  resolve: {{
    extensions: ['.tsx', '.ts', '.js', '.jsx']
  }},
  externals: {{
    'react': 'React',
    'react-dom': 'ReactDOM',
    'react-router': 'ReactRouter',
    'react-router-dom': 'ReactRouterDOM',
    'lodash': '_'
  }},
  optimization: {{
    minimize: true
  }},
  stats: {{
    colors: false,
    modules: false,
    chunks: false
  }}
}};
"#
    )
}

fn js_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "\\\\")
}
