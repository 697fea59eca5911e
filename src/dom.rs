//! Lightweight virtual document.
//!
//! Page templates are parsed once with html5ever into an owned tree that the
//! renderers mutate and then serialize. No browser or live DOM is involved,
//! so every rendering step is a plain function over [`Document`].
//!
//! ## Handles
//!
//! Elements are addressed by [`NodePath`]: the child index at each level from
//! the document root. A path stays valid as long as no ancestor's child list
//! is restructured, which holds for the attribute-only passes (asset
//! injection) that collect paths first and mutate second.
//!
//! ## Selectors
//!
//! Only the simple forms the site uses are supported:
//!
//! | Form | Matches |
//! |---|---|
//! | `#id` | element with that `id` |
//! | `.class` | element whose `class` list contains the token |
//! | `[attr]` | element carrying the attribute |
//! | `tag` | element with that local name |
//!
//! ## Serialization
//!
//! Output follows the HTML5 fragment serialization algorithm: void elements
//! have no end tag, raw-text elements (`script`, `style`, ...) emit their text
//! unescaped, text escapes `& < >` and U+00A0, attributes escape `& "` and
//! U+00A0. Attribute order is preserved from the template, so serialization
//! is deterministic.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Index path from the document root to a node.
pub type NodePath = Vec<usize>;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|t| t == class))
    }

    pub fn is_hidden(&self) -> bool {
        self.has_attr("hidden")
    }

    /// Toggle the boolean `hidden` attribute.
    pub fn set_hidden(&mut self, hidden: bool) {
        if hidden {
            self.set_attr("hidden", "");
        } else {
            self.remove_attr("hidden");
        }
    }

    /// Replace all children with a single text node (none for empty text).
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    /// Replace all children with the parsed `html` fragment.
    pub fn set_inner_html(&mut self, html: &str) {
        self.children = if html.is_empty() {
            Vec::new()
        } else {
            parse_fragment(html)
        };
    }

    pub fn append(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    /// Concatenated descendant text.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// Serialize this element's children.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            serialize_node(child, Some(&self.name), &mut out);
        }
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        serialize_element(self, &mut out);
        out
    }

    /// Descendant elements matching `selector`, in document order.
    pub fn select_all(&self, selector: &str) -> Vec<&Element> {
        let selector = Selector::parse(selector);
        let mut found = Vec::new();
        collect_matching(&self.children, &selector, &mut found);
        found
    }

    pub fn select_first(&self, selector: &str) -> Option<&Element> {
        self.select_all(selector).into_iter().next()
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// A parsed HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    children: Vec<Node>,
}

impl Document {
    /// Parse a full HTML document. html5ever never fails on malformed input;
    /// it repairs it the way a browser would.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        Self {
            children: convert_children(&dom.document),
        }
    }

    /// Element with the given `id`, first in document order.
    pub fn by_id(&self, id: &str) -> Option<&Element> {
        self.path_by_id(id).and_then(|p| self.element(&p))
    }

    pub fn by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        let path = self.path_by_id(id)?;
        self.element_mut(&path)
    }

    pub fn path_by_id(&self, id: &str) -> Option<NodePath> {
        self.select_paths(&format!("#{id}")).into_iter().next()
    }

    /// Paths of all elements matching `selector`, in document order.
    pub fn select_paths(&self, selector: &str) -> Vec<NodePath> {
        let selector = Selector::parse(selector);
        let mut found = Vec::new();
        let mut path = Vec::new();
        collect_paths(&self.children, &selector, &mut path, &mut found);
        found
    }

    pub fn element(&self, path: &[usize]) -> Option<&Element> {
        let (first, rest) = path.split_first()?;
        let mut current = self.children.get(*first)?.as_element()?;
        for index in rest {
            current = current.children.get(*index)?.as_element()?;
        }
        Some(current)
    }

    pub fn element_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let (first, rest) = path.split_first()?;
        let mut current = self.children.get_mut(*first)?.as_element_mut()?;
        for index in rest {
            current = current.children.get_mut(*index)?.as_element_mut()?;
        }
        Some(current)
    }

    /// The `<body>` element, if the document has one.
    pub fn body(&self) -> Option<&Element> {
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find(|e| e.name == "html")
            .and_then(|html| html.child_elements().find(|e| e.name == "body"))
    }

    fn body_mut(&mut self) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find(|e| e.name == "html")
            .and_then(|html| html.child_elements_mut().find(|e| e.name == "body"))
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            serialize_node(child, None, &mut out);
        }
        out
    }
}

/// Parse an HTML fragment as body content.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
    let mut doc = Document::parse(&wrapped);
    doc.body_mut()
        .map(|body| std::mem::take(&mut body.children))
        .unwrap_or_default()
}

// ============================================================================
// Selectors
// ============================================================================

enum Selector {
    Id(String),
    Class(String),
    Attr(String),
    Tag(String),
}

impl Selector {
    fn parse(selector: &str) -> Self {
        let s = selector.trim();
        if let Some(id) = s.strip_prefix('#') {
            Selector::Id(id.to_string())
        } else if let Some(class) = s.strip_prefix('.') {
            Selector::Class(class.to_string())
        } else if let Some(attr) = s.strip_prefix('[').and_then(|a| a.strip_suffix(']')) {
            Selector::Attr(attr.trim().to_string())
        } else {
            Selector::Tag(s.to_ascii_lowercase())
        }
    }

    fn matches(&self, element: &Element) -> bool {
        match self {
            Selector::Id(id) => element.attr("id") == Some(id.as_str()),
            Selector::Class(class) => element.has_class(class),
            Selector::Attr(attr) => element.has_attr(attr),
            Selector::Tag(tag) => element.name == *tag,
        }
    }
}

fn collect_paths(
    nodes: &[Node],
    selector: &Selector,
    path: &mut NodePath,
    found: &mut Vec<NodePath>,
) {
    for (index, node) in nodes.iter().enumerate() {
        if let Node::Element(element) = node {
            path.push(index);
            if selector.matches(element) {
                found.push(path.clone());
            }
            collect_paths(&element.children, selector, path, found);
            path.pop();
        }
    }
}

fn collect_matching<'a>(nodes: &'a [Node], selector: &Selector, found: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(element) = node {
            if selector.matches(element) {
                found.push(element);
            }
            collect_matching(&element.children, selector, found);
        }
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
            _ => {}
        }
    }
}

// ============================================================================
// rcdom → owned tree
// ============================================================================

fn convert_children(handle: &Handle) -> Vec<Node> {
    handle
        .children
        .borrow()
        .iter()
        .filter_map(convert_node)
        .collect()
}

fn convert_node(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Doctype { name, .. } => Some(Node::Doctype(name.to_string())),
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(Node::Comment(contents.to_string())),
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|a| {
                    let key = match &a.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, a.name.local),
                        None => a.name.local.to_string(),
                    };
                    (key, a.value.to_string())
                })
                .collect();
            // <template> keeps its content in a separate fragment.
            let children = match template_contents.borrow().as_ref() {
                Some(contents) => convert_children(contents),
                None => convert_children(handle),
            };
            Some(Node::Element(Element {
                name: name.local.to_string(),
                attrs,
                children,
            }))
        }
        NodeData::Document | NodeData::ProcessingInstruction { .. } => None,
    }
}

// ============================================================================
// Serialization
// ============================================================================

fn serialize_node(node: &Node, parent: Option<&str>, out: &mut String) {
    match node {
        Node::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Text(text) => {
            if parent.is_some_and(|p| RAW_TEXT_ELEMENTS.contains(&p)) {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        Node::Element(element) => serialize_element(element, out),
    }
}

fn serialize_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&element.name.as_str()) {
        return;
    }

    // The parser drops one leading newline in these; restore it.
    if matches!(element.name.as_str(), "pre" | "textarea" | "listing")
        && matches!(element.children.first(), Some(Node::Text(t)) if t.starts_with('\n'))
    {
        out.push('\n');
    }

    for child in &element.children {
        serialize_node(child, Some(&element.name), out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en"><head><title>Events</title>
<script type="application/json" id="event-data">{}</script></head>
<body>
<section id="speakersSection"><div id="speakersGrid" class="grid people"></div></section>
<img id="hero" data-static-code="hero-background" alt="Hero">
<p class="lead">Tom &amp; Jerry</p>
</body></html>"#;

    #[test]
    fn parse_and_serialize_preserves_structure() {
        let doc = Document::parse(PAGE);
        let html = doc.to_html();
        assert!(html.starts_with("<!DOCTYPE html><html lang=\"en\"><head><title>Events</title>"));
        assert!(html.contains(r#"<img id="hero" data-static-code="hero-background" alt="Hero">"#));
        assert!(!html.contains("</img>"));
        assert!(html.contains("<p class=\"lead\">Tom &amp; Jerry</p>"));
        assert!(html.ends_with("</body></html>"));
    }

    #[test]
    fn serialization_is_stable_across_reparse() {
        let once = Document::parse(PAGE).to_html();
        let twice = Document::parse(&once).to_html();
        assert_eq!(once, twice);
    }

    #[test]
    fn lookup_by_id_and_selectors() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.by_id("hero").and_then(|e| e.attr("alt")), Some("Hero"));
        assert!(doc.by_id("missing").is_none());
        assert_eq!(doc.select_paths(".people").len(), 1);
        assert_eq!(doc.select_paths("[data-static-code]").len(), 1);
        assert_eq!(doc.select_paths("section").len(), 1);
        assert_eq!(doc.select_paths("SECTION").len(), 1);
    }

    #[test]
    fn hidden_toggle_keeps_markup() {
        let mut doc = Document::parse(PAGE);
        doc.by_id_mut("speakersSection").unwrap().set_hidden(true);
        let html = doc.to_html();
        assert!(html.contains(r#"<section id="speakersSection" hidden="">"#));
        assert!(html.contains(r#"<div id="speakersGrid" class="grid people"></div>"#));

        doc.by_id_mut("speakersSection").unwrap().set_hidden(false);
        assert!(!doc.to_html().contains("hidden"));
    }

    #[test]
    fn set_text_escapes_and_raw_text_does_not() {
        let mut doc = Document::parse(PAGE);
        doc.by_id_mut("speakersGrid")
            .unwrap()
            .set_text("<b>not markup</b>");
        doc.by_id_mut("event-data")
            .unwrap()
            .set_text(r#"{"a":"<b>"}"#);
        let html = doc.to_html();
        assert!(html.contains("&lt;b&gt;not markup&lt;/b&gt;"));
        assert!(html.contains(r#"{"a":"<b>"}</script>"#));
    }

    #[test]
    fn inner_html_is_parsed_into_nodes() {
        let mut doc = Document::parse(PAGE);
        let grid = doc.by_id_mut("speakersGrid").unwrap();
        grid.set_inner_html(r#"<article class="card"><span>Ada</span></article>"#);
        assert_eq!(grid.select_all(".card").len(), 1);
        assert_eq!(grid.text_content(), "Ada");
    }

    #[test]
    fn fragment_parsing_returns_body_children() {
        let nodes = parse_fragment("<span>a</span> text <!-- note -->");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].as_element().map(|e| e.name.as_str()), Some("span"));
        assert_eq!(nodes[1], Node::Text(" text ".into()));
        assert_eq!(nodes[2], Node::Comment(" note ".into()));
    }

    #[test]
    fn attributes_escape_quotes_and_ampersands() {
        let el = Element::new("img")
            .with_attr("src", "https://cdn/x.jpg?a=1&b=2")
            .with_attr("alt", "say \"hi\"");
        assert_eq!(
            el.outer_html(),
            r#"<img src="https://cdn/x.jpg?a=1&amp;b=2" alt="say &quot;hi&quot;">"#
        );
    }

    #[test]
    fn set_attr_keeps_position() {
        let mut el = Element::new("img")
            .with_attr("src", "a")
            .with_attr("alt", "b");
        el.set_attr("src", "c");
        assert_eq!(el.outer_html(), r#"<img src="c" alt="b">"#);
    }

    #[test]
    fn element_paths_address_nested_nodes() {
        let mut doc = Document::parse(PAGE);
        let paths = doc.select_paths("[data-static-code]");
        let img = doc.element_mut(&paths[0]).unwrap();
        img.set_attr("src", "https://cdn/hero.jpg");
        assert_eq!(
            doc.by_id("hero").and_then(|e| e.attr("src")),
            Some("https://cdn/hero.jpg")
        );
    }

    #[test]
    fn template_contents_survive_round_trip() {
        let doc = Document::parse("<body><template id=\"t\"><li>x</li></template></body>");
        assert!(doc.to_html().contains("<template id=\"t\"><li>x</li></template>"));
    }
}
