//! Per-page renderers.
//!
//! Every renderer follows the same protocol against a shared [`BuildContext`]:
//!
//! 1. fetch the page's content through the context's [`ContentSource`];
//! 2. fail with [`RenderError::EmptyContent`] when the minimum data is missing;
//! 3. load the template and map records into cards and sections, hiding (not
//!    removing) template sections whose collection is empty;
//! 4. inject static images through the context's [`AssetResolver`];
//! 5. embed client-side state as JSON where the page needs it;
//! 6. write the serialized document under the output directory.
//!
//! | Module | Template / output path |
//! |--------|------------------------|
//! | [`landing`] | `index.html` |
//! | [`events`] | `sites/events/events.html` |
//! | [`about`] | `sites/about/about.html` |
//! | [`team`] | `sites/team/team.html` |
//! | [`watch`] | `sites/watch/watch.html` |
//! | [`static_pages`] | each configured `site.static_pages` entry |
//!
//! Card markup is written with Maud and spliced into the document as parsed
//! nodes, so the page and the cards share one serializer.

pub mod about;
pub mod events;
pub mod landing;
pub mod static_pages;
pub mod team;
pub mod watch;

use crate::assets::{AssetResolver, PARAMS_ATTRS, ResolveOptions, Target, pick_attr};
use crate::config::SiteConfig;
use crate::content::{ContentError, ContentSource};
use crate::dom::{Document, Node, parse_fragment};
use crate::template::{TemplateError, load_template, write_output};
use maud::Markup;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{0}")]
    EmptyContent(String),
    #[error("Template is missing required element #{0}")]
    MissingElement(&'static str),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// State shared by all renderers during one build.
///
/// Owns the asset cache, so each context (one per build or per standalone
/// render command) starts with an empty cache.
pub struct BuildContext<'a> {
    pub config: SiteConfig,
    /// Project root holding the page templates.
    pub root: PathBuf,
    /// Output directory.
    pub dist: PathBuf,
    pub content: &'a dyn ContentSource,
    pub assets: AssetResolver,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        config: SiteConfig,
        root: PathBuf,
        dist: PathBuf,
        content: &'a dyn ContentSource,
    ) -> Self {
        Self {
            config,
            root,
            dist,
            content,
            assets: AssetResolver::new(),
        }
    }

    pub fn brand(&self) -> &str {
        &self.config.site.brand
    }

    pub fn load(&self, rel: &str) -> Result<Document, RenderError> {
        Ok(load_template(&self.root, rel)?)
    }

    pub fn write(&self, rel: &str, doc: &Document) -> Result<PathBuf, RenderError> {
        let path = write_output(&self.dist, rel, doc)?;
        log::debug!("wrote {}", path.display());
        Ok(path)
    }

    /// Run the asset resolver over `doc`.
    pub fn inject(&mut self, doc: &mut Document, options: &ResolveOptions) -> Result<(), RenderError> {
        let content = self.content;
        self.assets.resolve(content, doc, options)?;
        Ok(())
    }
}

/// Code attributes honoured on page-level hero images.
const IMAGE_CODE_ATTRS: &[&str] = &[
    "data-static-code",
    "data-static-image-code",
    "data-image-code",
];

/// Alt attributes honoured on page-level hero images.
const IMAGE_ALT_ATTRS: &[&str] = &["data-static-alt", "data-static-image-alt", "data-image-alt"];

/// Explicit asset target for the image `#id`.
///
/// The element's own attributes win over the configured code, params and
/// alt text; a blank alt falls back to `default_alt`.
fn image_target(
    doc: &Document,
    id: &str,
    default_code: &str,
    default_params: &str,
    default_alt: &str,
) -> Target {
    let element = doc.by_id(id);
    let code = element
        .and_then(|e| pick_attr(e, IMAGE_CODE_ATTRS))
        .unwrap_or(default_code)
        .trim();
    let params = element
        .and_then(|e| pick_attr(e, PARAMS_ATTRS))
        .unwrap_or(default_params);
    let alt = element
        .and_then(|e| pick_attr(e, IMAGE_ALT_ATTRS).or(e.attr("alt")))
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(default_alt);
    Target::by_id(id, code).params(params).alt(alt)
}

/// Maud markup → document nodes.
fn markup_nodes(markup: Markup) -> Vec<Node> {
    parse_fragment(&markup.into_string())
}

/// Serialize a payload for an inline `<script>`; `</` is escaped so the data
/// cannot close the element early.
pub fn json_payload(value: &impl Serialize) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Set the text of `#id` if present.
fn set_text(doc: &mut Document, id: &str, text: &str) {
    if let Some(element) = doc.by_id_mut(id) {
        element.set_text(text);
    }
}
