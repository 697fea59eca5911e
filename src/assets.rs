//! Static image resolver.
//!
//! Templates mark `<img>` elements with a stable asset code; the resolver
//! looks the codes up in the CMS (`ImageStatic` entries) and fills in `src`
//! and `alt`. Several attribute spellings are accepted for each setting; the
//! alias tables below list them in priority order and are the only place
//! that knowledge lives.
//!
//! ## Lookup
//!
//! ```text
//! targets ─┬─ scanned from marker attributes
//!          └─ explicit (id / selector / path), overriding scanned ones
//!     │
//!     ▼
//! unique codes ─▶ cache miss? ─▶ one batched query (code_in, limit = n)
//!     │
//!     ▼
//! apply: src = url + params | placeholder ; alt = asset alt | fallback | existing
//! ```
//!
//! The [`AssetCache`] lives for one build. A code the CMS does not know is
//! cached as absent, so every unique code costs at most one query per build.

use crate::content::{ContentError, ContentQuery, ContentSource, decode};
use crate::dom::{Document, Element, NodePath};
use crate::model::{Collection, ImageAsset};
use crate::queries::STATIC_IMAGES_BY_CODE_QUERY;
use serde::Deserialize;
use std::collections::HashMap;

/// Attributes carrying the asset code.
pub const CODE_ATTRS: &[&str] = &[
    "data-static-code",
    "data-cf-code",
    "data-static-image-code",
    "data-image-code",
];

/// Attributes carrying CDN transformation parameters.
pub const PARAMS_ATTRS: &[&str] = &[
    "data-static-params",
    "data-static-image-params",
    "data-image-params",
];

/// Attributes carrying a fallback alt text.
pub const ALT_ATTRS: &[&str] = &["data-static-alt", "data-static-image-alt"];

/// Attributes carrying a placeholder `src`.
pub const PLACEHOLDER_ATTRS: &[&str] = &[
    "data-placeholder",
    "data-static-placeholder",
    "data-static-image-placeholder",
];

/// Selectors scanned when no explicit target covers an element.
pub const SCAN_SELECTORS: &[&str] = &[
    "[data-static-code]",
    "[data-static-image-code]",
    "[data-image-code]",
    "[data-cf-code]",
];

/// First non-blank value among `aliases`.
pub fn pick_attr<'a>(element: &'a Element, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|name| element.attr(name))
        .find(|v| !v.trim().is_empty())
}

/// Trim and upgrade protocol-relative URLs to https. `None` when blank.
pub fn normalize_url(url: Option<&str>) -> Option<String> {
    let trimmed = url?.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.starts_with("//") {
        Some(format!("https:{trimmed}"))
    } else {
        Some(trimmed.to_string())
    }
}

/// Append CDN parameters with `?` or `&` as appropriate.
pub fn with_params(url: &str, params: &str) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{params}")
}

/// Where an explicit target lives in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Selector(String),
    Path(NodePath),
}

/// Caller-supplied injection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub locator: Locator,
    pub code: String,
    pub params: Option<String>,
    pub alt: Option<String>,
    pub placeholder: Option<String>,
}

impl Target {
    pub fn by_id(id: &str, code: impl Into<String>) -> Self {
        Self {
            locator: Locator::Id(id.to_string()),
            code: code.into(),
            params: None,
            alt: None,
            placeholder: None,
        }
    }

    pub fn params(mut self, params: impl Into<String>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// How a resolve pass behaves.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Explicit targets; they win over scanned elements.
    pub targets: Vec<Target>,
    /// Params used when neither the element nor the target supplies any.
    pub default_params: String,
    /// Propagate query failures instead of degrading to "absent".
    pub strict: bool,
}

impl ResolveOptions {
    /// Scan-only, non-strict pass.
    pub fn scan() -> Self {
        Self::default()
    }
}

/// Code → asset map for one build. `None` records a code known to be absent.
#[derive(Debug, Default)]
pub struct AssetCache {
    entries: HashMap<String, Option<ImageAsset>>,
}

impl AssetCache {
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&ImageAsset> {
        self.entries.get(code).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A target bound to a concrete element.
#[derive(Debug, Clone)]
struct Binding {
    path: NodePath,
    code: String,
    params: String,
    fallback_alt: String,
    placeholder: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StaticImagesData {
    #[serde(default)]
    image_static_collection: Collection<ImageAsset>,
}

/// Resolves asset codes into `src`/`alt` attributes.
#[derive(Debug, Default)]
pub struct AssetResolver {
    cache: AssetCache,
}

impl AssetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Inject assets into `doc`.
    ///
    /// Elements whose code is unknown, or whose asset could not be fetched in
    /// non-strict mode, are left as they are apart from an optional
    /// placeholder.
    pub fn resolve(
        &mut self,
        source: &dyn ContentSource,
        doc: &mut Document,
        options: &ResolveOptions,
    ) -> Result<(), ContentError> {
        let bindings = bind_targets(doc, options);
        let mut codes: Vec<String> = Vec::new();
        for binding in &bindings {
            if !codes.contains(&binding.code) {
                codes.push(binding.code.clone());
            }
        }
        if codes.is_empty() {
            return Ok(());
        }

        let fetched = match self.fetch(source, &codes) {
            Ok(()) => true,
            Err(err) if options.strict => return Err(err),
            Err(err) => {
                log::warn!("static images could not be fetched: {err}");
                false
            }
        };

        for binding in &bindings {
            let asset = if fetched {
                self.cache.get(&binding.code)
            } else {
                None
            };
            if let Some(element) = doc.element_mut(&binding.path) {
                apply(element, binding, asset);
            }
        }
        Ok(())
    }

    /// Fetch every code not yet cached in a single query.
    fn fetch(&mut self, source: &dyn ContentSource, codes: &[String]) -> Result<(), ContentError> {
        let missing: Vec<String> = codes
            .iter()
            .filter(|c| !self.cache.contains(c))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        log::debug!("fetching {} static image(s): {:?}", missing.len(), missing);
        let limit = missing.len().max(1);
        let query = ContentQuery::new("StaticImagesByCode", STATIC_IMAGES_BY_CODE_QUERY)
            .var("codes", missing.clone())
            .var("limit", limit);
        let data: StaticImagesData = decode(source.execute(&query)?)?;

        for code in missing {
            self.cache.entries.insert(code, None);
        }
        for asset in data.image_static_collection.items {
            if let Some(code) = asset.code.clone().filter(|c| !c.is_empty()) {
                self.cache.entries.insert(code, Some(asset));
            }
        }
        Ok(())
    }
}

fn bind_targets(doc: &Document, options: &ResolveOptions) -> Vec<Binding> {
    let mut bindings: Vec<Binding> = Vec::new();

    for selector in SCAN_SELECTORS {
        for path in doc.select_paths(selector) {
            // An element matched by several selectors keeps its first binding.
            if bindings.iter().any(|b| b.path == path) {
                continue;
            }
            let Some(element) = doc.element(&path) else {
                continue;
            };
            let Some(code) = pick_attr(element, CODE_ATTRS) else {
                continue;
            };
            bindings.push(Binding {
                code: code.trim().to_string(),
                params: pick_attr(element, PARAMS_ATTRS)
                    .map(str::to_string)
                    .unwrap_or_else(|| options.default_params.clone()),
                fallback_alt: pick_attr(element, ALT_ATTRS)
                    .or(element.attr("alt"))
                    .unwrap_or_default()
                    .to_string(),
                placeholder: pick_attr(element, PLACEHOLDER_ATTRS)
                    .unwrap_or_default()
                    .to_string(),
                path,
            });
        }
    }

    for target in &options.targets {
        let path = match &target.locator {
            Locator::Id(id) => doc.path_by_id(id),
            Locator::Selector(selector) => doc.select_paths(selector).into_iter().next(),
            Locator::Path(path) => Some(path.clone()),
        };
        let Some(path) = path else { continue };
        let Some(element) = doc.element(&path) else {
            continue;
        };
        let code = target.code.trim();
        if code.is_empty() {
            continue;
        }
        let binding = Binding {
            code: code.to_string(),
            params: non_empty(target.params.as_deref())
                .unwrap_or(&options.default_params)
                .to_string(),
            fallback_alt: non_empty(target.alt.as_deref())
                .or(element.attr("alt"))
                .unwrap_or_default()
                .to_string(),
            placeholder: non_empty(target.placeholder.as_deref())
                .or(element.attr("data-placeholder"))
                .unwrap_or_default()
                .to_string(),
            path,
        };
        match bindings.iter_mut().find(|b| b.path == binding.path) {
            Some(existing) => *existing = binding,
            None => bindings.push(binding),
        }
    }
    bindings
}

fn apply(element: &mut Element, binding: &Binding, asset: Option<&ImageAsset>) {
    let url = asset.and_then(|a| normalize_url(a.file.as_ref().and_then(|f| f.url.as_deref())));
    match url {
        Some(url) => element.set_attr("src", with_params(&url, &binding.params)),
        None => {
            let has_src = element.attr("src").is_some_and(|s| !s.is_empty());
            if !binding.placeholder.is_empty() && !has_src {
                element.set_attr("src", binding.placeholder.clone());
            }
        }
    }

    let alt = asset
        .and_then(|a| non_empty(a.alt_description.as_deref()))
        .or_else(|| {
            asset
                .and_then(|a| a.file.as_ref())
                .and_then(|f| non_empty(f.description.as_deref()))
        })
        .or(non_empty(Some(binding.fallback_alt.as_str())))
        .map(str::to_string);
    if let Some(alt) = alt {
        element.set_attr("alt", alt);
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockContent;
    use serde_json::json;

    const TEMPLATE: &str = r#"<!DOCTYPE html><html><head></head><body>
<img id="a" data-static-code="hero" data-static-params="w=800" alt="Old">
<img id="b" data-cf-code="hero">
<img id="c" data-image-code="logo" data-placeholder="/img/blank.png">
<img id="d" data-static-image-code="missing" data-static-alt="Fallback" src="/keep.png">
<img id="e">
</body></html>"#;

    fn images(items: serde_json::Value) -> MockContent {
        MockContent::new(move |_| Ok(json!({"imageStaticCollection": {"items": items.clone()}})))
    }

    fn src<'a>(doc: &'a Document, id: &str) -> Option<&'a str> {
        doc.by_id(id).and_then(|e| e.attr("src"))
    }

    fn alt<'a>(doc: &'a Document, id: &str) -> Option<&'a str> {
        doc.by_id(id).and_then(|e| e.attr("alt"))
    }

    #[test]
    fn duplicate_codes_cost_one_batched_query() {
        let content = images(json!([
            {"code": "hero", "altDiscription": "Crowd", "file": {"url": "//cdn/hero.jpg"}},
            {"code": "logo", "file": {"url": "https://cdn/logo.png?v=2", "description": "Logo"}},
        ]));
        let mut resolver = AssetResolver::new();
        let mut doc = Document::parse(TEMPLATE);
        resolver
            .resolve(&content, &mut doc, &ResolveOptions::scan())
            .unwrap();

        let calls = content.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "StaticImagesByCode");
        assert_eq!(
            calls[0].variables.get("codes"),
            Some(&json!(["hero", "missing", "logo"]))
        );
        assert_eq!(calls[0].variables.get("limit"), Some(&json!(3)));

        assert_eq!(src(&doc, "a"), Some("https://cdn/hero.jpg?w=800"));
        assert_eq!(alt(&doc, "a"), Some("Crowd"));
        assert_eq!(src(&doc, "b"), Some("https://cdn/hero.jpg"));
        assert_eq!(src(&doc, "c"), Some("https://cdn/logo.png?v=2"));
        assert_eq!(alt(&doc, "c"), Some("Logo"));
        assert!(doc.by_id("e").unwrap().attrs.is_empty());
    }

    #[test]
    fn absent_codes_are_cached_and_not_requeried() {
        let content = images(json!([]));
        let mut resolver = AssetResolver::new();
        let mut doc = Document::parse(TEMPLATE);
        resolver
            .resolve(&content, &mut doc, &ResolveOptions::scan())
            .unwrap();
        let mut again = Document::parse(TEMPLATE);
        resolver
            .resolve(&content, &mut again, &ResolveOptions::scan())
            .unwrap();

        assert_eq!(content.calls().len(), 1);
        assert_eq!(resolver.cache().len(), 3);
        assert!(resolver.cache().contains("hero"));
        assert!(resolver.cache().get("hero").is_none());

        // Placeholder only when the element has no src of its own.
        assert_eq!(src(&again, "c"), Some("/img/blank.png"));
        assert_eq!(src(&again, "d"), Some("/keep.png"));
        assert_eq!(alt(&again, "d"), Some("Fallback"));
        assert_eq!(alt(&again, "a"), Some("Old"));
    }

    #[test]
    fn explicit_target_overrides_scanned_element() {
        let content = images(json!([
            {"code": "hero", "file": {"url": "https://cdn/hero.jpg"}},
            {"code": "override", "file": {"url": "https://cdn/other.jpg"}},
        ]));
        let options = ResolveOptions {
            targets: vec![
                Target::by_id("a", "override").params("fm=webp").alt("Explicit"),
                Target::by_id("e", "hero"),
                Target::by_id("nope", "hero"),
            ],
            default_params: "q=80".into(),
            strict: false,
        };
        let mut doc = Document::parse(TEMPLATE);
        AssetResolver::new()
            .resolve(&content, &mut doc, &options)
            .unwrap();

        assert_eq!(src(&doc, "a"), Some("https://cdn/other.jpg?fm=webp"));
        assert_eq!(alt(&doc, "a"), Some("Explicit"));
        assert_eq!(src(&doc, "e"), Some("https://cdn/hero.jpg?q=80"));
        assert_eq!(src(&doc, "b"), Some("https://cdn/hero.jpg?q=80"));
    }

    #[test]
    fn query_failure_degrades_unless_strict() {
        let failing = MockContent::new(|_| Err(ContentError::Query("boom".into())));
        let mut doc = Document::parse(TEMPLATE);
        AssetResolver::new()
            .resolve(&failing, &mut doc, &ResolveOptions::scan())
            .unwrap();
        assert_eq!(src(&doc, "c"), Some("/img/blank.png"));
        assert_eq!(src(&doc, "a"), None);

        let strict = ResolveOptions {
            strict: true,
            ..ResolveOptions::default()
        };
        let mut doc = Document::parse(TEMPLATE);
        let err = AssetResolver::new()
            .resolve(&failing, &mut doc, &strict)
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn failed_fetch_is_not_cached() {
        let failing = MockContent::new(|_| Err(ContentError::Query("down".into())));
        let mut resolver = AssetResolver::new();
        let mut doc = Document::parse(TEMPLATE);
        resolver
            .resolve(&failing, &mut doc, &ResolveOptions::scan())
            .unwrap();
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn no_codes_means_no_query() {
        let content = images(json!([]));
        let mut doc = Document::parse("<p>plain</p>");
        AssetResolver::new()
            .resolve(&content, &mut doc, &ResolveOptions::scan())
            .unwrap();
        assert!(content.calls().is_empty());
    }

    #[test]
    fn url_helpers() {
        assert_eq!(normalize_url(Some(" //cdn/x ")), Some("https://cdn/x".into()));
        assert_eq!(normalize_url(Some("  ")), None);
        assert_eq!(normalize_url(None), None);
        assert_eq!(with_params("https://a/x", "w=1"), "https://a/x?w=1");
        assert_eq!(with_params("https://a/x?v=2", "w=1"), "https://a/x?v=2&w=1");
        assert_eq!(with_params("https://a/x", ""), "https://a/x");
    }
}
