//! Per-request build workspaces.
//!
//! Every top-level build call gets its own uniquely named directory under
//! the scratch root, so concurrent builds never share staged files. The
//! owning orchestrator removes the directory on every exit path.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::BuildResult;

pub(crate) const COMPONENT_FILE: &str = "index.tsx";
pub(crate) const ENTRY_FILE: &str = "entry.tsx";
pub(crate) const CONFIG_FILE: &str = "build.config.js";

/// Exclusive scratch directory for one build attempt chain.
pub struct BuildWorkspace {
    root: PathBuf,
}

impl BuildWorkspace {
    /// Create `<scratch_root>/<page_id>-<uuid>/` with a `src/` subdirectory.
    /// The path is absolute so the rendered compiler configuration stays
    /// valid regardless of the compiler's working directory.
    pub async fn create(scratch_root: &Path, page_id: &str) -> BuildResult<Self> {
        fs::create_dir_all(scratch_root).await?;
        let scratch_root = fs::canonicalize(scratch_root).await?;

        let root = scratch_root.join(format!("{}-{}", page_id, Uuid::new_v4()));
        fs::create_dir_all(root.join("src")).await?;
        debug!("Created build workspace {:?}", root);

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate component source, `src/index.tsx`.
    pub fn component_path(&self) -> PathBuf {
        self.root.join("src").join(COMPONENT_FILE)
    }

    /// Generated entry glue, `src/entry.tsx`.
    pub fn entry_path(&self) -> PathBuf {
        self.root.join("src").join(ENTRY_FILE)
    }

    /// Rendered compiler configuration, `build.config.js`.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Write the three staged files for one attempt.
    pub async fn stage(&self, source: &str, entry: &str, config: &str) -> BuildResult<()> {
        fs::write(self.component_path(), source).await?;
        fs::write(self.entry_path(), entry).await?;
        fs::write(self.config_path(), config).await?;
        Ok(())
    }

    /// Remove the staged files after an attempt, whatever its outcome.
    /// Failures are logged and swallowed.
    pub async fn release_staged(&self) {
        for path in [self.component_path(), self.entry_path(), self.config_path()] {
            if let Err(e) = fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove staged file {:?}: {}", path, e);
                }
            }
        }
    }

    /// Remove the whole workspace directory. Failures are logged and
    /// swallowed; a leaked scratch directory must not fail the build.
    pub async fn cleanup(&self) {
        if let Err(e) = fs::remove_dir_all(&self.root).await {
            warn!("Could not remove build workspace {:?}: {}", self.root, e);
        } else {
            debug!("Removed build workspace {:?}", self.root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_workspaces_are_unique_per_request() {
        let scratch = tempdir().unwrap();

        let first = BuildWorkspace::create(scratch.path(), "page-1").await.unwrap();
        let second = BuildWorkspace::create(scratch.path(), "page-1").await.unwrap();

        assert_ne!(first.root(), second.root());
        assert!(first.root().is_dir());
        assert!(second.root().is_dir());
    }

    #[tokio::test]
    async fn test_stage_and_release() {
        let scratch = tempdir().unwrap();
        let workspace = BuildWorkspace::create(scratch.path(), "page-1").await.unwrap();

        workspace.stage("source", "entry", "config").await.unwrap();
        assert!(workspace.component_path().exists());
        assert!(workspace.entry_path().exists());
        assert!(workspace.config_path().exists());

        workspace.release_staged().await;
        assert!(!workspace.component_path().exists());
        assert!(!workspace.entry_path().exists());
        assert!(!workspace.config_path().exists());
        // The directory itself survives until cleanup.
        assert!(workspace.root().is_dir());
    }

    #[tokio::test]
    async fn test_release_tolerates_missing_files() {
        let scratch = tempdir().unwrap();
        let workspace = BuildWorkspace::create(scratch.path(), "page-1").await.unwrap();
        // Nothing staged; release must not panic or error.
        workspace.release_staged().await;
    }

    #[tokio::test]
    async fn test_cleanup_removes_everything() {
        let scratch = tempdir().unwrap();
        let workspace = BuildWorkspace::create(scratch.path(), "page-1").await.unwrap();
        workspace.stage("a", "b", "c").await.unwrap();

        workspace.cleanup().await;
        assert!(!workspace.root().exists());
    }
}
