//! Filesystem store for generated pages.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{PageError, PageResult};
use crate::metadata::{PageKind, PageMetadata};
use crate::templates;

/// HTML shell file name inside a page directory.
pub const CONTENT_FILE: &str = "index.html";
/// Component source file name inside a page directory.
pub const SOURCE_FILE: &str = "app.tsx";
/// Metadata record file name inside a page directory.
pub const METADATA_FILE: &str = "page.json";
/// Compiled bundle file name inside a page directory.
pub const BUNDLE_FILE: &str = "main.js";

/// Store for page content, component source and metadata.
///
/// Cheap to clone; holds only the two root paths.
#[derive(Clone)]
pub struct PageStore {
    pages_root: PathBuf,
    templates_root: PathBuf,
}

impl PageStore {
    /// Create a store over the given roots. Directories are created lazily;
    /// call [`ensure_roots`](Self::ensure_roots) at startup to fail fast.
    pub fn new(pages_root: impl AsRef<Path>, templates_root: impl AsRef<Path>) -> Self {
        Self {
            pages_root: pages_root.as_ref().to_path_buf(),
            templates_root: templates_root.as_ref().to_path_buf(),
        }
    }

    /// Root directory holding one subdirectory per page.
    pub fn pages_root(&self) -> &Path {
        &self.pages_root
    }

    /// Create both root directories if they do not exist.
    pub async fn ensure_roots(&self) -> PageResult<()> {
        fs::create_dir_all(&self.pages_root).await?;
        fs::create_dir_all(&self.templates_root).await?;
        Ok(())
    }

    /// Directory holding all files for one page.
    pub fn page_dir(&self, page_id: &str) -> PathBuf {
        self.pages_root.join(page_id)
    }

    /// Deterministic location of the compiled bundle for a page.
    pub fn bundle_path(&self, page_id: &str) -> PathBuf {
        self.page_dir(page_id).join(BUNDLE_FILE)
    }

    /// Whether a compiled bundle exists for the page.
    pub async fn has_bundle(&self, page_id: &str) -> bool {
        fs::try_exists(self.bundle_path(page_id)).await.unwrap_or(false)
    }

    /// Seed a new page: component source from the kind's template, an HTML
    /// shell bound to the page id, and a fresh metadata record.
    ///
    /// Returns the seeded component source. Re-initializing an existing page
    /// overwrites all three files.
    pub async fn initialize_page(
        &self,
        page_id: &str,
        kind: PageKind,
        title: &str,
    ) -> PageResult<String> {
        let dir = self.page_dir(page_id);
        fs::create_dir_all(&dir).await?;

        let source = self.load_template(kind).await?;
        let metadata = PageMetadata::new(page_id, title, kind);

        fs::write(dir.join(SOURCE_FILE), &source).await?;
        fs::write(dir.join(CONTENT_FILE), templates::html_shell(page_id)).await?;
        fs::write(dir.join(METADATA_FILE), serde_json::to_string_pretty(&metadata)?).await?;

        debug!("Initialized page {} ({}) titled {:?}", page_id, kind, title);
        Ok(source)
    }

    /// Read the page's HTML content. `NotFound` when the page has never been
    /// initialized.
    pub async fn read_content(&self, page_id: &str) -> PageResult<String> {
        read_or_not_found(self.page_dir(page_id).join(CONTENT_FILE), page_id).await
    }

    /// Replace the page's HTML content and touch the metadata timestamp.
    pub async fn write_content(&self, page_id: &str, content: &str) -> PageResult<()> {
        let dir = self.page_dir(page_id);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(CONTENT_FILE), content).await?;
        self.touch_metadata(page_id).await;
        Ok(())
    }

    /// Replace the page's component source and touch the metadata timestamp.
    pub async fn write_component_source(&self, page_id: &str, source: &str) -> PageResult<()> {
        let dir = self.page_dir(page_id);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(SOURCE_FILE), source).await?;
        self.touch_metadata(page_id).await;
        Ok(())
    }

    /// Read the page's component source. `NotFound` when missing.
    pub async fn read_component_source(&self, page_id: &str) -> PageResult<String> {
        read_or_not_found(self.page_dir(page_id).join(SOURCE_FILE), page_id).await
    }

    /// Load the metadata record for a page.
    pub async fn metadata(&self, page_id: &str) -> PageResult<PageMetadata> {
        let raw = read_or_not_found(self.page_dir(page_id).join(METADATA_FILE), page_id).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// List all pages, newest first, optionally filtered by kind.
    ///
    /// Pages without a metadata record are included with a kind detected from
    /// their content and timestamps taken from the directory. Scan failures
    /// degrade to an empty list rather than an error.
    pub async fn list_pages(&self, filter: Option<PageKind>) -> Vec<PageMetadata> {
        let mut entries = match fs::read_dir(&self.pages_root).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not scan pages root {:?}: {}", self.pages_root, e);
                return Vec::new();
            }
        };

        let mut pages = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Could not read pages root entry: {}", e);
                    return Vec::new();
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let metadata = match fs::read_to_string(path.join(METADATA_FILE)).await {
                Ok(raw) => match serde_json::from_str::<PageMetadata>(&raw) {
                    Ok(meta) => meta,
                    Err(e) => {
                        warn!("Skipping page with invalid metadata at {:?}: {}", path, e);
                        continue;
                    }
                },
                Err(_) => match self.recover_metadata(&entry).await {
                    Some(meta) => meta,
                    None => continue,
                },
            };

            if filter.map_or(true, |kind| metadata.kind == kind) {
                pages.push(metadata);
            }
        }

        pages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pages
    }

    /// Build a metadata record for a page directory that has none, from its
    /// content markers and directory timestamps.
    async fn recover_metadata(&self, entry: &fs::DirEntry) -> Option<PageMetadata> {
        let path = entry.path();
        let id = path.file_name()?.to_str()?.to_string();

        let content = match fs::read_to_string(path.join(CONTENT_FILE)).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping page {} without metadata or content: {}", id, e);
                return None;
            }
        };

        let (created_at, updated_at) = match entry.metadata().await {
            Ok(meta) => (
                system_time_or_now(meta.created().or_else(|_| meta.modified())),
                system_time_or_now(meta.modified()),
            ),
            Err(_) => (Utc::now(), Utc::now()),
        };

        Some(PageMetadata {
            id: id.clone(),
            title: id,
            kind: templates::detect_kind(&content),
            created_at,
            updated_at,
            description: None,
            tags: None,
        })
    }

    /// Update the metadata `updatedAt` timestamp. Metadata problems are
    /// logged and swallowed; content writes must not fail because of them.
    async fn touch_metadata(&self, page_id: &str) {
        let path = self.page_dir(page_id).join(METADATA_FILE);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                warn!("Could not read metadata for {}: {}", page_id, e);
                return;
            }
        };

        let mut metadata: PageMetadata = match serde_json::from_str(&raw) {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Could not parse metadata for {}: {}", page_id, e);
                return;
            }
        };
        metadata.updated_at = Utc::now();

        let serialized = match serde_json::to_string_pretty(&metadata) {
            Ok(s) => s,
            Err(e) => {
                warn!("Could not serialize metadata for {}: {}", page_id, e);
                return;
            }
        };
        if let Err(e) = fs::write(&path, serialized).await {
            warn!("Could not write metadata for {}: {}", page_id, e);
        }
    }

    /// Template source for a kind: `<templates_root>/<kind>.tsx`, seeded from
    /// the built-in default on first use.
    async fn load_template(&self, kind: PageKind) -> PageResult<String> {
        let path = self.templates_root.join(format!("{}.tsx", kind.as_str()));
        match fs::read_to_string(&path).await {
            Ok(template) => Ok(template),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let template = templates::default_component(kind);
                fs::create_dir_all(&self.templates_root).await?;
                fs::write(&path, template).await?;
                debug!("Seeded default {} template at {:?}", kind, path);
                Ok(template.to_string())
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn read_or_not_found(path: PathBuf, page_id: &str) -> PageResult<String> {
    match fs::read_to_string(&path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(PageError::NotFound(page_id.to_string())),
        Err(e) => Err(e.into()),
    }
}

fn system_time_or_now(time: std::io::Result<std::time::SystemTime>) -> DateTime<Utc> {
    time.map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now())
}
