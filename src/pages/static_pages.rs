//! Template-only pages.
//!
//! Each configured page is loaded, scanned for static image codes, and
//! written back out. Pages missing from the project are skipped.

use super::{BuildContext, RenderError};
use crate::assets::ResolveOptions;
use crate::template::TemplateError;
use std::path::PathBuf;

pub fn render(ctx: &mut BuildContext) -> Result<Vec<PathBuf>, RenderError> {
    let pages = ctx.config.site.static_pages.clone();
    let mut written = Vec::with_capacity(pages.len());
    for rel in &pages {
        let mut doc = match ctx.load(rel) {
            Ok(doc) => doc,
            Err(RenderError::Template(TemplateError::Missing(path))) => {
                log::info!("skipping {rel}: {} does not exist", path.display());
                continue;
            }
            Err(err) => return Err(err),
        };
        ctx.inject(&mut doc, &ResolveOptions::scan())?;
        written.push(ctx.write(rel, &doc)?);
    }
    Ok(written)
}
