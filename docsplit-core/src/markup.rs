//! Markup tree shared by the renderer output and the segmenter.
//!
//! Wraps a leniently parsed HTML document and provides the traversal
//! primitives the segmenter scans are built from: a bounded pre-order
//! element walker, top-level ancestor lookup and exact re-serialization
//! of container children.

use scraper::node::Node;
use scraper::{ElementRef, Html};

pub struct MarkupTree {
    html: Html,
}

impl MarkupTree {
    /// Parse markup. HTML5 parsing never fails; fragments are wrapped in
    /// an implicit `<html><body>`.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// The top-level content container whose direct children are the unit
    /// of page slicing.
    pub fn body(&self) -> ElementRef<'_> {
        let root = self.root();
        root.children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
            .unwrap_or(root)
    }

    /// Every element of the container in document order, container excluded.
    pub fn body_elements(&self) -> ElementWalker<'_> {
        let body = self.body();
        ElementWalker::within(body)
    }
}

/// Lazy pre-order iterator over elements, bounded to a root element.
///
/// Cloning yields an independent walker at the same position, so several
/// scans can share one traversal primitive.
#[derive(Clone)]
pub struct ElementWalker<'a> {
    next: Option<ElementRef<'a>>,
    root: ElementRef<'a>,
}

impl<'a> ElementWalker<'a> {
    /// Walk the descendants of `root`, excluding `root` itself.
    pub fn within(root: ElementRef<'a>) -> Self {
        Self {
            next: first_element_child(root),
            root,
        }
    }

    /// Walk from `start` (inclusive) to the end of `root`.
    pub fn starting_at(start: ElementRef<'a>, root: ElementRef<'a>) -> Self {
        Self {
            next: Some(start),
            root,
        }
    }

    /// Walk from the first element following `start`'s subtree.
    pub fn after(start: ElementRef<'a>, root: ElementRef<'a>) -> Self {
        let mut walker = Self {
            next: None,
            root,
        };
        walker.next = walker.following(start);
        walker
    }

    /// Do not descend into `el`; it must be the element most recently yielded.
    pub fn skip_subtree(&mut self, el: ElementRef<'a>) {
        self.next = self.following(el);
    }

    fn following(&self, el: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let mut node = el;
        loop {
            if node.id() == self.root.id() {
                return None;
            }
            if let Some(sibling) = next_element_sibling(node) {
                return Some(sibling);
            }
            node = parent_element(node)?;
        }
    }
}

impl<'a> Iterator for ElementWalker<'a> {
    type Item = ElementRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = first_element_child(current).or_else(|| self.following(current));
        Some(current)
    }
}

pub fn first_element_child(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.children().find_map(ElementRef::wrap)
}

pub fn next_element_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

/// Whether `el` is `ancestor` or lies inside it.
pub fn is_within(el: ElementRef<'_>, ancestor: ElementRef<'_>) -> bool {
    el.id() == ancestor.id() || el.ancestors().any(|a| a.id() == ancestor.id())
}

/// Concatenated text of the element and its descendants.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Text with runs of whitespace collapsed to one space and the ends trimmed.
pub fn normalized_text(el: ElementRef<'_>) -> String {
    element_text(el).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The ancestor of `el` (or `el` itself) that is a direct child of `container`.
pub fn top_level_child<'a>(el: ElementRef<'a>, container: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut node = el;
    loop {
        let parent = parent_element(node)?;
        if parent.id() == container.id() {
            return Some(node);
        }
        node = parent;
    }
}

/// First `<a href>` inside `el` (including `el`).
pub fn first_anchor_href(el: ElementRef<'_>) -> Option<String> {
    el.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|a| a.value().name() == "a")
        .find_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Serialize the direct children of `container` in the index range
/// `[start, end)`, where indices count every child node. Elements are
/// emitted exactly as the parser re-serializes them; whitespace-only
/// text and comments are dropped.
pub fn serialize_children_range(container: ElementRef<'_>, start: usize, end: usize) -> String {
    let mut out = String::new();
    for (_, node) in container
        .children()
        .enumerate()
        .filter(|(i, _)| *i >= start && *i < end)
    {
        match ElementRef::wrap(node) {
            Some(el) => out.push_str(&el.html()),
            None => push_text(&mut out, node.value()),
        }
    }
    out
}

/// Text between the end of `el`'s subtree and the next element in document
/// order, climbing out of ancestors up to `root`. Escaped and filtered like
/// `serialize_children_range`.
pub fn following_text(el: ElementRef<'_>, root: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut node = el;
    loop {
        if node.id() == root.id() {
            return out;
        }
        for sibling in node.next_siblings() {
            if sibling.value().is_element() {
                return out;
            }
            push_text(&mut out, sibling.value());
        }
        match parent_element(node) {
            Some(parent) => node = parent,
            None => return out,
        }
    }
}

/// Text ahead of `el`'s first child element.
pub fn leading_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for child in el.children() {
        if child.value().is_element() {
            break;
        }
        push_text(&mut out, child.value());
    }
    out
}

fn push_text(out: &mut String, node: &Node) {
    if let Node::Text(text) = node {
        if !text.trim().is_empty() {
            out.push_str(&escape_text(text));
        }
    }
}

/// Index of `el` among all child nodes of its parent.
pub fn child_index(container: ElementRef<'_>, el: ElementRef<'_>) -> Option<usize> {
    container.children().position(|n| n.id() == el.id())
}

pub fn child_count(container: ElementRef<'_>) -> usize {
    container.children().count()
}

/// Must mirror html5ever's text serialization (as used by `ElementRef::html`),
/// so sliced and whole-element output stay byte-compatible.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(walker: ElementWalker<'_>) -> Vec<String> {
        walker.map(|el| el.value().name().to_string()).collect()
    }

    #[test]
    fn walker_is_preorder_and_bounded() {
        let tree = MarkupTree::parse("<div><p><span>a</span></p><ul><li>b</li></ul></div><h1>c</h1>");
        assert_eq!(names(tree.body_elements()), vec!["div", "p", "span", "ul", "li", "h1"]);
    }

    #[test]
    fn walker_after_skips_subtree() {
        let tree = MarkupTree::parse("<div><p><span>a</span></p><ul><li>b</li></ul></div><h1>c</h1>");
        let body = tree.body();
        let p = tree.body_elements().find(|e| e.value().name() == "p").unwrap();
        assert_eq!(names(ElementWalker::after(p, body)), vec!["ul", "li", "h1"]);

        let div = tree.body_elements().next().unwrap();
        let mut walker = ElementWalker::starting_at(div, body);
        let first = walker.next().unwrap();
        walker.skip_subtree(first);
        assert_eq!(names(walker), vec!["h1"]);
    }

    #[test]
    fn walker_within_inner_root_stops_at_root() {
        let tree = MarkupTree::parse("<div><p>a</p></div><p>outside</p>");
        let div = tree.body_elements().next().unwrap();
        assert_eq!(names(ElementWalker::within(div)), vec!["p"]);
    }

    #[test]
    fn walker_is_restartable() {
        let tree = MarkupTree::parse("<p>a</p><p>b</p>");
        let walker = tree.body_elements();
        let again = walker.clone();
        assert_eq!(walker.count(), 2);
        assert_eq!(again.count(), 2);
    }

    #[test]
    fn top_level_child_of_nested_element() {
        let tree = MarkupTree::parse("<div><section><h1>x</h1></section></div><p>y</p>");
        let body = tree.body();
        let h1 = tree.body_elements().find(|e| e.value().name() == "h1").unwrap();
        let top = top_level_child(h1, body).unwrap();
        assert_eq!(top.value().name(), "div");

        let p = tree.body_elements().find(|e| e.value().name() == "p").unwrap();
        assert_eq!(top_level_child(p, body).unwrap().id(), p.id());
    }

    #[test]
    fn text_helpers() {
        let tree = MarkupTree::parse("<p>  Meta   title: <b>Hello</b>\n world </p>");
        let p = tree.body_elements().next().unwrap();
        assert_eq!(normalized_text(p), "Meta title: Hello world");
    }

    #[test]
    fn anchor_lookup() {
        let tree = MarkupTree::parse(r#"<p>URL: <a href=" https://example.com/x ">link</a></p>"#);
        let p = tree.body_elements().next().unwrap();
        assert_eq!(first_anchor_href(p).as_deref(), Some("https://example.com/x"));
    }

    #[test]
    fn children_range_serializes_exactly() {
        let tree = MarkupTree::parse("<h1>A &amp; B</h1>\n<p class=\"c1\">x</p>\n<p>y</p>");
        let body = tree.body();
        let h1 = tree.body_elements().next().unwrap();
        let last = tree.body_elements().last().unwrap();
        let start = child_index(body, h1).unwrap();
        let end = child_index(body, last).unwrap();
        assert_eq!(
            serialize_children_range(body, start, end),
            "<h1>A &amp; B</h1><p class=\"c1\">x</p>"
        );
    }

    #[test]
    fn loose_text_around_elements() {
        let tree = MarkupTree::parse("<div>lead<p>a</p> tail &amp; x</div> more<h1>c</h1>");
        let body = tree.body();
        let div = tree.body_elements().next().unwrap();
        let p = tree.body_elements().find(|e| e.value().name() == "p").unwrap();
        assert_eq!(leading_text(div), "lead");
        assert_eq!(following_text(p, body), " tail &amp; x more");
        assert_eq!(following_text(p, div), " tail &amp; x");
    }
}
