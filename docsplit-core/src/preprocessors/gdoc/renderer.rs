use super::document::{DocumentTree, ParagraphElement, TextStyle};
use crate::config::RendererConfig;
use quick_xml::escape::partial_escape;
use std::fmt::Write;

/// Renders a native document tree into the markup the segmenter reads.
///
/// Paragraphs become `h1`-`h6` or `p`; bulleted paragraphs become nested
/// `ul`/`ol` lists. Tables, section breaks and other blocks are dropped.
#[derive(Debug, Clone)]
pub struct Renderer {
    emit_title_class: bool,
    default_heading_level: u8,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(&RendererConfig::default())
    }
}

impl Renderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            emit_title_class: config.emit_title_class,
            default_heading_level: config.default_heading_level.clamp(1, 6),
        }
    }

    pub fn render(&self, doc: &DocumentTree) -> String {
        let mut out = String::new();
        let mut lists = ListStack::default();
        let mut dropped = 0usize;

        for block in &doc.body.content {
            let Some(paragraph) = &block.paragraph else {
                dropped += 1;
                continue;
            };
            let content = render_inline(&paragraph.elements);

            if let Some(bullet) = &paragraph.bullet {
                lists.push_item(
                    &mut out,
                    &bullet.list_id,
                    bullet.nesting_level,
                    |level| doc.is_ordered(&bullet.list_id, level),
                    &content,
                );
                continue;
            }

            lists.close_all(&mut out);
            if content.trim().is_empty() {
                continue;
            }
            let style = paragraph.paragraph_style.named_style_type.as_deref();
            match self.block_tag(style) {
                BlockTag::Heading(level) => {
                    let _ = write!(out, "<h{level}>{content}</h{level}>");
                }
                BlockTag::Classed(class) => {
                    let _ = write!(out, r#"<p class="{class}">{content}</p>"#);
                }
                BlockTag::Paragraph => {
                    let _ = write!(out, "<p>{content}</p>");
                }
            }
        }
        lists.close_all(&mut out);

        if dropped > 0 {
            tracing::debug!("Dropped {} non-paragraph blocks while rendering", dropped);
        }
        out
    }

    fn block_tag(&self, named_style: Option<&str>) -> BlockTag {
        match named_style.unwrap_or_default() {
            "TITLE" if self.emit_title_class => BlockTag::Classed("title"),
            "SUBTITLE" if self.emit_title_class => BlockTag::Classed("subtitle"),
            style => match style.strip_prefix("HEADING_") {
                Some(level) => {
                    let level = level
                        .parse::<u8>()
                        .ok()
                        .filter(|n| (1..=6).contains(n))
                        .unwrap_or(self.default_heading_level);
                    BlockTag::Heading(level)
                }
                None => BlockTag::Paragraph,
            },
        }
    }
}

enum BlockTag {
    Heading(u8),
    Classed(&'static str),
    Paragraph,
}

#[derive(Debug)]
struct OpenList {
    tag: &'static str,
    item_open: bool,
}

/// Open-list state carried across consecutive list items.
///
/// Each open level remembers its tag and whether its last `<li>` is still
/// open, so deeper lists nest inside the parent item.
#[derive(Debug, Default)]
pub struct ListStack {
    open: Vec<OpenList>,
    current_list_id: Option<String>,
}

impl ListStack {
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn current_list_id(&self) -> Option<&str> {
        self.current_list_id.as_deref()
    }

    /// Emit one list item at `nesting_level` (zero-based) of `list_id`.
    ///
    /// A different list id closes everything first. Deeper levels are opened
    /// one at a time, shallower ones closed from the top down.
    pub fn push_item<F>(
        &mut self,
        out: &mut String,
        list_id: &str,
        nesting_level: usize,
        ordered_at: F,
        content: &str,
    ) where
        F: Fn(usize) -> bool,
    {
        if self.current_list_id.as_deref() != Some(list_id) {
            self.close_all(out);
            self.current_list_id = Some(list_id.to_string());
        }

        let depth = nesting_level + 1;
        while self.open.len() > depth {
            self.pop(out);
        }
        if self.open.len() == depth {
            if let Some(top) = self.open.last_mut() {
                if top.item_open {
                    out.push_str("</li>");
                    top.item_open = false;
                }
            }
        }
        while self.open.len() < depth {
            let tag = if ordered_at(self.open.len()) { "ol" } else { "ul" };
            let _ = write!(out, "<{tag}>");
            self.open.push(OpenList {
                tag,
                item_open: false,
            });
        }

        let _ = write!(out, "<li>{content}");
        if let Some(top) = self.open.last_mut() {
            top.item_open = true;
        }
    }

    pub fn close_all(&mut self, out: &mut String) {
        while !self.open.is_empty() {
            self.pop(out);
        }
        self.current_list_id = None;
    }

    fn pop(&mut self, out: &mut String) {
        if let Some(list) = self.open.pop() {
            if list.item_open {
                out.push_str("</li>");
            }
            let _ = write!(out, "</{}>", list.tag);
        }
    }
}

/// Render a paragraph's text runs.
///
/// Text is escaped for `<`, `>` and `&` only. Wrappers are applied in the
/// order bold, italic, underline, strikethrough, and a link wraps the result.
/// Paragraph-ending newlines are dropped and vertical tabs become `<br>`.
pub fn render_inline(elements: &[ParagraphElement]) -> String {
    let mut out = String::new();

    for run in elements.iter().filter_map(|e| e.text_run.as_ref()) {
        let text = run.content.replace('\n', "");
        if text.is_empty() {
            continue;
        }
        let escaped = text
            .split('\u{000b}')
            .map(|part| partial_escape(part).into_owned())
            .collect::<Vec<_>>()
            .join("<br>");
        out.push_str(&wrap_styles(escaped, &run.text_style));
    }

    out
}

fn wrap_styles(mut text: String, style: &TextStyle) -> String {
    let wrappers = [
        (style.bold, "strong"),
        (style.italic, "em"),
        (style.underline, "u"),
        (style.strikethrough, "s"),
    ];
    for (_, tag) in wrappers.iter().filter(|(on, _)| *on) {
        text = format!("<{tag}>{text}</{tag}>");
    }

    match style.link.as_ref().and_then(|l| l.url.as_deref()) {
        Some(url) if !url.is_empty() => format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{text}</a>"#,
            escape_attribute(url)
        ),
        _ => text,
    }
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn para(style: &str, text: &str) -> serde_json::Value {
        json!({"paragraph": {
            "elements": [{"textRun": {"content": text, "textStyle": {}}}],
            "paragraphStyle": {"namedStyleType": style}
        }})
    }

    fn item(list: &str, level: usize, text: &str) -> serde_json::Value {
        json!({"paragraph": {
            "elements": [{"textRun": {"content": text, "textStyle": {}}}],
            "paragraphStyle": {"namedStyleType": "NORMAL_TEXT"},
            "bullet": {"listId": list, "nestingLevel": level}
        }})
    }

    fn doc(content: Vec<serde_json::Value>, lists: serde_json::Value) -> DocumentTree {
        serde_json::from_value(json!({"body": {"content": content}, "lists": lists})).unwrap()
    }

    fn render(content: Vec<serde_json::Value>, lists: serde_json::Value) -> String {
        Renderer::default().render(&doc(content, lists))
    }

    #[test]
    fn headings_paragraphs_and_titles() {
        let html = render(
            vec![
                para("TITLE", "Page 1\n"),
                para("HEADING_1", "Hello\n"),
                para("HEADING_3", "Sub\n"),
                para("HEADING_9", "Odd\n"),
                para("NORMAL_TEXT", "Body\n"),
                para("SUBTITLE", "Tag\n"),
            ],
            json!({}),
        );
        assert_eq!(
            html,
            r#"<p class="title">Page 1</p><h1>Hello</h1><h3>Sub</h3><h2>Odd</h2><p>Body</p><p class="subtitle">Tag</p>"#
        );
    }

    #[test]
    fn title_class_can_be_disabled() {
        let renderer = Renderer::new(&RendererConfig {
            emit_title_class: false,
            default_heading_level: 3,
        });
        let html = renderer.render(&doc(
            vec![para("TITLE", "T\n"), para("HEADING_X", "H\n")],
            json!({}),
        ));
        assert_eq!(html, "<p>T</p><h3>H</h3>");
    }

    #[test]
    fn empty_paragraphs_are_dropped() {
        let html = render(
            vec![para("NORMAL_TEXT", "A\n"), para("NORMAL_TEXT", "  \n"), para("NORMAL_TEXT", "\n")],
            json!({}),
        );
        assert_eq!(html, "<p>A</p>");
    }

    #[test]
    fn nested_unordered_list() {
        let html = render(
            vec![item("l1", 0, "a\n"), item("l1", 1, "b\n"), item("l1", 0, "c\n")],
            json!({}),
        );
        assert_eq!(html, "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>");
    }

    #[test]
    fn different_lists_never_nest() {
        let html = render(
            vec![item("l1", 0, "a\n"), item("l1", 1, "b\n"), item("l2", 1, "c\n")],
            json!({}),
        );
        assert_eq!(
            html,
            "<ul><li>a<ul><li>b</li></ul></li></ul><ul><ul><li>c</li></ul></ul>"
        );
    }

    #[test]
    fn level_jumps_open_and_close_one_at_a_time() {
        let lists = json!({"l1": {"listProperties": {"nestingLevels": [
            {"glyphType": "DECIMAL"}, {"glyphSymbol": "○"}, {"glyphType": "ALPHA"}
        ]}}});
        let html = render(
            vec![item("l1", 0, "a\n"), item("l1", 2, "b\n"), para("NORMAL_TEXT", "after\n")],
            lists,
        );
        assert_eq!(
            html,
            "<ol><li>a<ul><ol><li>b</li></ol></ul></li></ol><p>after</p>"
        );
    }

    #[test]
    fn list_closed_at_end_of_document() {
        let html = render(vec![item("l1", 0, "only\n")], json!({}));
        assert_eq!(html, "<ul><li>only</li></ul>");
    }

    #[test]
    fn list_stack_state() {
        let mut out = String::new();
        let mut stack = ListStack::default();
        stack.push_item(&mut out, "x", 1, |_| false, "i");
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current_list_id(), Some("x"));
        stack.close_all(&mut out);
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current_list_id(), None);
        assert_eq!(out, "<ul><ul><li>i</li></ul></ul>");
    }

    #[test]
    fn inline_styles_escape_and_links() {
        let elements: Vec<ParagraphElement> = serde_json::from_value(json!([
            {"textRun": {"content": "a < b & \"c\"", "textStyle": {"bold": true, "italic": true}}},
            {"textRun": {"content": "go", "textStyle": {"underline": true, "link": {"url": "https://x.com/?a=1&b=\"2\""}}}},
            {"textRun": {"content": "x\u{000b}y\n", "textStyle": {"strikethrough": true}}},
            {"textRun": {"content": "\n", "textStyle": {"bold": true}}}
        ]))
        .unwrap();
        assert_eq!(
            render_inline(&elements),
            concat!(
                "<em><strong>a &lt; b &amp; \"c\"</strong></em>",
                r#"<a href="https://x.com/?a=1&amp;b=&quot;2&quot;" target="_blank" rel="noopener noreferrer"><u>go</u></a>"#,
                "<s>x<br>y</s>"
            )
        );
    }

    #[test]
    fn non_paragraph_blocks_are_skipped() {
        let html = render(
            vec![
                json!({"sectionBreak": {}}),
                para("NORMAL_TEXT", "A\n"),
                json!({"table": {"rows": 2}}),
                para("NORMAL_TEXT", "B\n"),
            ],
            json!({}),
        );
        assert_eq!(html, "<p>A</p><p>B</p>");
    }
}
