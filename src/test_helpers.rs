//! Shared test utilities.
//!
//! Provides a recording [`MockContent`] source, fixture setup, and a few
//! document lookups used by the page renderer tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = setup_site();
//! let content = MockContent::new(|q| match q.name {
//!     "TeamByYear" => Ok(json!({"newTeamMemberCardCollection": {"items": []}})),
//!     _ => Ok(json!({})),
//! });
//! let mut ctx = test_context(&site, &content);
//! ```

use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::content::{ContentError, ContentQuery, ContentSource};
use crate::dom::{Document, Element};
use crate::pages::BuildContext;

// =========================================================================
// Mock content source
// =========================================================================

type Responder = Box<dyn Fn(&ContentQuery) -> Result<Value, ContentError> + Send + Sync>;

/// Content source that answers from a closure and records every query.
/// Uses Mutex (not RefCell) so it is Sync like a real client.
pub struct MockContent {
    respond: Responder,
    calls: Mutex<Vec<ContentQuery>>,
}

impl MockContent {
    pub fn new(
        respond: impl Fn(&ContentQuery) -> Result<Value, ContentError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every query executed so far, in order.
    pub fn calls(&self) -> Vec<ContentQuery> {
        self.calls.lock().unwrap().clone()
    }

    /// Names of the executed queries, in order.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(|q| q.name).collect()
    }
}

impl ContentSource for MockContent {
    fn execute(&self, query: &ContentQuery) -> Result<Value, ContentError> {
        self.calls.lock().unwrap().push(query.clone());
        (self.respond)(query)
    }
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Build context rooted at `site` with output in `site/dist`.
pub fn test_context<'a>(site: &TempDir, content: &'a dyn ContentSource) -> BuildContext<'a> {
    BuildContext::new(
        SiteConfig::default(),
        site.path().to_path_buf(),
        site.path().join("dist"),
        content,
    )
}

/// Read and parse a rendered page from the context's output directory.
pub fn read_output(site: &TempDir, rel: &str) -> Document {
    let path = site.path().join("dist").join(rel);
    let html = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("output {} not readable: {e}", path.display()));
    Document::parse(&html)
}

// =========================================================================
// Document lookups (panic on miss)
// =========================================================================

/// Element by id. Panics if not found.
pub fn by_id<'a>(doc: &'a Document, id: &str) -> &'a Element {
    doc.by_id(id)
        .unwrap_or_else(|| panic!("element #{id} not found"))
}

/// Text of each descendant of `root` matching `selector`, in order.
pub fn texts(root: &Element, selector: &str) -> Vec<String> {
    root.select_all(selector)
        .iter()
        .map(|e| e.text_content())
        .collect()
}
