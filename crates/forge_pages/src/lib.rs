//! # forge_pages
//!
//! Page persistence layer for PageForge.
//!
//! Every page lives in its own directory under the pages root:
//! ```text
//! <pages_root>/<pageId>/
//! ├── index.html    # HTML shell served to viewers
//! ├── app.tsx       # React component source (model-generated)
//! ├── page.json     # Page metadata
//! └── main.js       # Compiled bundle (written by the build pipeline)
//! ```
//!
//! The store is deliberately dumb: text blobs plus one small JSON record per
//! page. Orchestration, retries and broadcasting live in the crates above it.

pub mod error;
pub mod metadata;
pub mod store;
pub mod templates;

pub use error::{PageError, PageResult};
pub use metadata::{PageKind, PageMetadata};
pub use store::{PageStore, BUNDLE_FILE, CONTENT_FILE, METADATA_FILE, SOURCE_FILE};
