//! Integration tests for the build pipeline.
//!
//! These tests drive the orchestrator with mocked compilers and repair
//! requesters, so no webpack installation or model endpoint is needed.

use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;

use forge_build::{
    BuildConfig, BuildError, BuildOrchestrator, BuildRequest, MockCompileResponse, MockCompiler,
    MockRepairer,
};

fn orchestrator(
    compiler: &MockCompiler,
    repairer: &MockRepairer,
    scratch_root: &Path,
) -> BuildOrchestrator {
    BuildOrchestrator::with_config(
        Arc::new(compiler.clone()),
        Arc::new(repairer.clone()),
        BuildConfig {
            scratch_root: scratch_root.to_path_buf(),
            max_repairs: 3,
        },
    )
}

fn request(dir: &Path, page_id: &str, source: &str) -> BuildRequest {
    BuildRequest {
        page_id: page_id.to_string(),
        source: source.to_string(),
        output_dir: dir.join("pages").join(page_id),
    }
}

/// A clean first compile produces the bundle without any repair round.
#[tokio::test]
async fn test_build_succeeds_first_try() {
    let dir = tempdir().unwrap();
    let compiler = MockCompiler::new().add_response(MockCompileResponse::success("compiled"));
    let repairer = MockRepairer::new();
    let orchestrator = orchestrator(&compiler, &repairer, &dir.path().join("builds"));

    let request = request(dir.path(), "page-1", "const x = 1");
    let bundle = orchestrator.build(&request).await.unwrap();

    assert_eq!(bundle, request.output_dir.join("main.js"));
    assert!(bundle.exists());
    assert_eq!(compiler.call_count(), 1);
    assert_eq!(repairer.call_count(), 0);
}

/// All three staged files are present in the workspace during the compile.
#[tokio::test]
async fn test_build_stages_component_entry_and_config() {
    let dir = tempdir().unwrap();
    let compiler = MockCompiler::new();
    let repairer = MockRepairer::new();
    let orchestrator = orchestrator(&compiler, &repairer, &dir.path().join("builds"));

    let request = request(dir.path(), "page-1", "const x = 1");
    orchestrator.build(&request).await.unwrap();

    let calls = compiler.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].page_id, "page-1");
    assert_eq!(calls[0].staged_source.as_deref(), Some("const x = 1"));

    let entry = calls[0].staged_entry.as_deref().unwrap();
    assert!(entry.contains("import App from './index'"));
    assert!(entry.contains("window['PageComponent_page-1'] = App"));

    let config = calls[0].staged_config.as_deref().unwrap();
    assert!(config.contains("library: 'PageComponent_page-1'"));
    assert!(config.contains("libraryTarget: 'umd'"));
    assert!(config.contains("clean: false"));
}

/// A failed compile triggers one repair and the repaired source is what
/// gets compiled next.
#[tokio::test]
async fn test_build_repairs_once_then_succeeds() {
    let dir = tempdir().unwrap();
    let compiler = MockCompiler::new().with_responses(vec![
        MockCompileResponse::failure(1, "SyntaxError: Unexpected token (3:7)"),
        MockCompileResponse::success("compiled"),
    ]);
    let repairer = MockRepairer::new().with_response("const fixed = 1");
    let orchestrator = orchestrator(&compiler, &repairer, &dir.path().join("builds"));

    let request = request(dir.path(), "page-1", "const broken = ");
    let bundle = orchestrator.build(&request).await.unwrap();

    assert!(bundle.exists());
    assert_eq!(compiler.call_count(), 2);
    assert_eq!(repairer.call_count(), 1);

    let repairs = repairer.get_calls();
    assert_eq!(repairs[0].attempt, 0);
    assert_eq!(repairs[0].source, "const broken = ");
    assert_eq!(repairs[0].kind_label, "syntax");

    let compiles = compiler.get_calls();
    assert_eq!(compiles[1].staged_source.as_deref(), Some("const fixed = 1"));
}

/// Three failed compiles exhaust the repair budget, and the fourth compile
/// can still succeed.
#[tokio::test]
async fn test_build_succeeds_on_final_attempt() {
    let dir = tempdir().unwrap();
    let compiler = MockCompiler::new().with_responses(vec![
        MockCompileResponse::failure(1, "SyntaxError: first"),
        MockCompileResponse::failure(1, "SyntaxError: second"),
        MockCompileResponse::failure(1, "SyntaxError: third"),
        MockCompileResponse::success("compiled"),
    ]);
    let repairer = MockRepairer::new();
    let orchestrator = orchestrator(&compiler, &repairer, &dir.path().join("builds"));

    let request = request(dir.path(), "page-1", "const broken = ");
    let bundle = orchestrator.build(&request).await.unwrap();

    assert!(bundle.exists());
    assert_eq!(compiler.call_count(), 4);
    assert_eq!(repairer.call_count(), 3);

    let attempts: Vec<u32> = repairer.get_calls().iter().map(|c| c.attempt).collect();
    assert_eq!(attempts, vec![0, 1, 2]);
}

/// A compile that keeps failing is retried exactly three times, so the
/// compiler runs four times in total and each repair sees the attempt index.
#[tokio::test]
async fn test_build_exhausts_repairs_then_fails() {
    let dir = tempdir().unwrap();
    let compiler = MockCompiler::new()
        .add_response(MockCompileResponse::failure(1, "SyntaxError: broken again"));
    let repairer = MockRepairer::new();
    let orchestrator = orchestrator(&compiler, &repairer, &dir.path().join("builds"));

    let request = request(dir.path(), "page-1", "const broken = ");
    let error = orchestrator.build(&request).await.unwrap_err();

    assert_eq!(compiler.call_count(), 4);
    assert_eq!(repairer.call_count(), 3);

    let attempts: Vec<u32> = repairer.get_calls().iter().map(|c| c.attempt).collect();
    assert_eq!(attempts, vec![0, 1, 2]);

    // Each repair round compiles the source returned by the previous one.
    let repairs = repairer.get_calls();
    assert_eq!(repairs[0].source, "const broken = ");
    assert!(repairs[1].source.starts_with("// repaired"));

    match error {
        BuildError::Failed { ref diagnostic } => {
            assert_eq!(diagnostic.kind.label(), "syntax");
        }
        other => panic!("Expected BuildError::Failed, got {other:?}"),
    }
    assert!(error.to_string().starts_with("Syntax error: "));
}

/// An empty repair result is fatal and keeps the diagnostic of the compile
/// it was meant to fix.
#[tokio::test]
async fn test_empty_repair_is_fatal() {
    let dir = tempdir().unwrap();
    let compiler = MockCompiler::new().add_response(MockCompileResponse::failure(
        1,
        "Module not found: Error: Can't resolve 'antd' in '/build/src'",
    ));
    let repairer = MockRepairer::new().with_response("   \n");
    let orchestrator = orchestrator(&compiler, &repairer, &dir.path().join("builds"));

    let request = request(dir.path(), "page-1", "import { Button } from 'antd'");
    let error = orchestrator.build(&request).await.unwrap_err();

    assert_eq!(compiler.call_count(), 1);
    assert_eq!(repairer.call_count(), 1);

    let message = error.to_string();
    assert!(message.contains("Cannot find module: antd"));
    assert!(message.ends_with("Check the source for third-party libraries that are not installed"));
}

/// A failed repair request is fatal and keeps the original diagnostic.
#[tokio::test]
async fn test_repair_error_is_fatal_with_original_diagnostic() {
    let dir = tempdir().unwrap();
    let compiler = MockCompiler::new().add_response(MockCompileResponse::failure(
        2,
        "Invalid configuration object. Webpack has been initialized using a configuration object",
    ));
    let repairer = MockRepairer::new().with_failure("model offline");
    let orchestrator = orchestrator(&compiler, &repairer, &dir.path().join("builds"));

    let request = request(dir.path(), "page-1", "const x = 1");
    let error = orchestrator.build(&request).await.unwrap_err();

    assert_eq!(compiler.call_count(), 1);
    assert_eq!(repairer.call_count(), 1);

    match error {
        BuildError::Failed { ref diagnostic } => {
            assert_eq!(diagnostic.kind.label(), "config");
        }
        other => panic!("Expected BuildError::Failed, got {other:?}"),
    }
    assert!(error.to_string().ends_with("Contact the system operator"));
}

/// A compiler that cannot run at all goes through classification and the
/// usual retry budget instead of aborting the pipeline.
#[tokio::test]
async fn test_compiler_process_error_is_classified() {
    let dir = tempdir().unwrap();
    let compiler = MockCompiler::new().simulate_failure("npx not found");
    let repairer = MockRepairer::new();
    let orchestrator = orchestrator(&compiler, &repairer, &dir.path().join("builds"));

    let request = request(dir.path(), "page-1", "const x = 1");
    let error = orchestrator.build(&request).await.unwrap_err();

    assert_eq!(compiler.call_count(), 4);
    match error {
        BuildError::Failed { ref diagnostic } => {
            assert_eq!(diagnostic.kind.label(), "unknown");
            assert!(diagnostic.raw.contains("npx not found"));
        }
        other => panic!("Expected BuildError::Failed, got {other:?}"),
    }
}

/// With repairs disabled the compiler runs once and the first failure is
/// already fatal.
#[tokio::test]
async fn test_zero_max_repairs_compiles_once() {
    let dir = tempdir().unwrap();
    let compiler = MockCompiler::new().add_response(MockCompileResponse::failure(1, "boom"));
    let repairer = MockRepairer::new();
    let orchestrator = BuildOrchestrator::with_config(
        Arc::new(compiler.clone()),
        Arc::new(repairer.clone()),
        BuildConfig {
            scratch_root: dir.path().join("builds"),
            max_repairs: 0,
        },
    );

    let request = request(dir.path(), "page-1", "const x = 1");
    let error = orchestrator.build(&request).await.unwrap_err();

    assert_eq!(compiler.call_count(), 1);
    assert_eq!(repairer.call_count(), 0);
    assert!(matches!(error, BuildError::Failed { .. }));
}

/// The scratch workspace is removed after a successful build.
#[tokio::test]
async fn test_workspace_removed_after_success() {
    let dir = tempdir().unwrap();
    let scratch_root = dir.path().join("builds");
    let compiler = MockCompiler::new();
    let repairer = MockRepairer::new();
    let orchestrator = orchestrator(&compiler, &repairer, &scratch_root);

    let request = request(dir.path(), "page-1", "const x = 1");
    orchestrator.build(&request).await.unwrap();

    let workspace = compiler.get_calls()[0].workspace.clone();
    assert!(!workspace.exists());
    assert_eq!(std::fs::read_dir(&scratch_root).unwrap().count(), 0);
}

/// The scratch workspace is removed after a fatal build failure too.
#[tokio::test]
async fn test_workspace_removed_after_failure() {
    let dir = tempdir().unwrap();
    let scratch_root = dir.path().join("builds");
    let compiler = MockCompiler::new().add_response(MockCompileResponse::failure(1, "boom"));
    let repairer = MockRepairer::new().with_failure("model offline");
    let orchestrator = orchestrator(&compiler, &repairer, &scratch_root);

    let request = request(dir.path(), "page-1", "const x = 1");
    let _ = orchestrator.build(&request).await.unwrap_err();

    let workspace = compiler.get_calls()[0].workspace.clone();
    assert!(!workspace.exists());
    assert_eq!(std::fs::read_dir(&scratch_root).unwrap().count(), 0);
}

/// Concurrent builds of the same page get isolated workspaces.
#[tokio::test]
async fn test_concurrent_builds_use_separate_workspaces() {
    let dir = tempdir().unwrap();
    let compiler = MockCompiler::new();
    let repairer = MockRepairer::new();
    let orchestrator = orchestrator(&compiler, &repairer, &dir.path().join("builds"));

    let first = BuildRequest {
        page_id: "page-1".to_string(),
        source: "const a = 1".to_string(),
        output_dir: dir.path().join("pages").join("page-1"),
    };
    let second = BuildRequest {
        page_id: "page-1".to_string(),
        source: "const b = 2".to_string(),
        output_dir: dir.path().join("pages-alt").join("page-1"),
    };

    let (left, right) = tokio::join!(orchestrator.build(&first), orchestrator.build(&second));
    assert!(left.is_ok());
    assert!(right.is_ok());

    let calls = compiler.get_calls();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].workspace, calls[1].workspace);
}
