//! PageForge server - main entry point.
//!
//! Wires the page store, event hub, model client and build pipeline
//! together and serves the HTTP API plus the WebSocket event stream.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use forge_build::{BuildConfig, BuildOrchestrator, ModelRepairRequester, ProcessCompiler};
use forge_core::{GenerationCoordinator, GeneratorConfig};
use forge_events::EventHub;
use forge_model::{EndpointConfig, HttpModelClient, ModelClient, ModelConfig};
use forge_pages::PageStore;

mod routes;
mod state;
mod ws;

use state::AppState;

/// AI page generation server.
#[derive(Parser, Debug)]
#[command(name = "pageforge", version, about)]
struct ServerArgs {
    /// Address to bind.
    #[arg(long, env = "PAGEFORGE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "PAGEFORGE_PORT", default_value_t = 3001)]
    port: u16,

    /// Directory generated pages are stored in.
    #[arg(long, env = "PAGEFORGE_PAGES_DIR", default_value = "generated-pages")]
    pages_dir: PathBuf,

    /// Directory holding the per-kind component templates.
    #[arg(long, env = "PAGEFORGE_TEMPLATES_DIR", default_value = "templates")]
    templates_dir: PathBuf,

    /// Scratch directory for build workspaces. Defaults to the system
    /// temp directory.
    #[arg(long, env = "PAGEFORGE_BUILD_DIR")]
    build_dir: Option<PathBuf>,

    /// Base URL of the hosted chat completion endpoint.
    #[arg(
        long,
        env = "PAGEFORGE_MODEL_URL",
        default_value = "https://api.moonshot.cn/v1"
    )]
    model_url: String,

    /// API key for the hosted endpoint. Without one the hosted endpoint is
    /// not used and requests route to the local endpoint or the offline
    /// fallback.
    #[arg(long, env = "PAGEFORGE_MODEL_API_KEY", hide_env_values = true)]
    model_api_key: Option<String>,

    /// Model served by the hosted endpoint.
    #[arg(long, env = "PAGEFORGE_MODEL_NAME", default_value = "moonshot-v1-8k")]
    model_name: String,

    /// Base URL of a local chat completion endpoint (LM Studio or similar).
    #[arg(long, env = "PAGEFORGE_LOCAL_MODEL_URL")]
    local_model_url: Option<String>,

    /// Model served by the local endpoint.
    #[arg(
        long,
        env = "PAGEFORGE_LOCAL_MODEL_NAME",
        default_value = "qwen3-4b-mix@8bit"
    )]
    local_model_name: String,

    /// Repair rounds allowed per component build.
    #[arg(long, env = "PAGEFORGE_MAX_REPAIRS", default_value_t = 3)]
    max_repairs: u32,

    /// Compiler command, split on whitespace. `--config <file>` is appended
    /// per build.
    #[arg(long, env = "PAGEFORGE_COMPILER", default_value = "npx webpack")]
    compiler: String,

    /// Compile timeout in seconds. 0 disables the timeout.
    #[arg(long, env = "PAGEFORGE_COMPILE_TIMEOUT", default_value_t = 300)]
    compile_timeout: u64,
}

impl ServerArgs {
    fn model_config(&self) -> ModelConfig {
        ModelConfig {
            primary: self.model_api_key.as_ref().map(|key| EndpointConfig {
                base_url: self.model_url.clone(),
                api_key: Some(key.clone()),
                model: self.model_name.clone(),
            }),
            local: self.local_model_url.as_ref().map(|url| EndpointConfig {
                base_url: url.clone(),
                api_key: None,
                model: self.local_model_name.clone(),
            }),
        }
    }

    fn build_config(&self) -> BuildConfig {
        let mut config = BuildConfig::default();
        if let Some(dir) = &self.build_dir {
            config.scratch_root = dir.clone();
        }
        config.max_repairs = self.max_repairs;
        config
    }

    fn compiler_command(&self) -> Vec<String> {
        self.compiler.split_whitespace().map(str::to_string).collect()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive("pageforge=info".parse()?)
                .add_directive("forge_pages=info".parse()?)
                .add_directive("forge_events=info".parse()?)
                .add_directive("forge_model=info".parse()?)
                .add_directive("forge_build=info".parse()?)
                .add_directive("forge_core=info".parse()?)
                .add_directive("tower_http=info".parse()?)
                .add_directive("warn".parse()?),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let args = ServerArgs::parse();

    let store = PageStore::new(&args.pages_dir, &args.templates_dir);
    store
        .ensure_roots()
        .await
        .context("preparing page directories")?;

    let hub = EventHub::new();
    let model: Arc<dyn ModelClient> = Arc::new(HttpModelClient::new(args.model_config()));

    let mut compiler = ProcessCompiler::new().with_command(args.compiler_command());
    if args.compile_timeout > 0 {
        compiler = compiler.with_timeout(Duration::from_secs(args.compile_timeout));
    }
    let builder = Arc::new(BuildOrchestrator::with_config(
        Arc::new(compiler),
        Arc::new(ModelRepairRequester::new(model.clone())),
        args.build_config(),
    ));

    let generator_config = GeneratorConfig {
        max_repairs: args.max_repairs,
        ..GeneratorConfig::default()
    };
    let coordinator = Arc::new(GenerationCoordinator::new(
        store.clone(),
        hub.clone(),
        model.clone(),
        builder,
        generator_config,
    ));

    let state = AppState {
        store,
        hub,
        model,
        coordinator,
    };
    let app = routes::router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("PageForge server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            // No SIGTERM handler; ctrl-c still works.
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
