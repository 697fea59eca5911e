//! Page template loading and output writing.
//!
//! Templates live in the project root at the same relative path their
//! rendered page takes in the output directory (`sites/team/team.html` is
//! rendered to `<dist>/sites/team/team.html`).

use crate::dom::Document;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Read and parse `<root>/<rel>`.
pub fn load_template(root: &Path, rel: &str) -> Result<Document, TemplateError> {
    let path = root.join(rel);
    match fs::read_to_string(&path) {
        Ok(html) => Ok(Document::parse(&html)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(TemplateError::Missing(path)),
        Err(e) => Err(e.into()),
    }
}

/// Serialize `doc` to `<dist>/<rel>`, creating parent directories.
pub fn write_output(dist: &Path, rel: &str, doc: &Document) -> Result<PathBuf, TemplateError> {
    let path = dist.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, doc.to_html())?;
    Ok(path)
}
