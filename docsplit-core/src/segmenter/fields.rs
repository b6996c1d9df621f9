use super::markers::{MarkerMatcher, PageMarker};
use crate::classifier::StyleClassifier;
use crate::config::FieldLabel;
use crate::links::RedirectUnwrapper;
use crate::markup::{first_anchor_href, normalized_text, ElementWalker};
use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

static BARE_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:https?://|www\.)[^\s<>"']+|\b[a-z0-9][a-z0-9-]*(?:\.[a-z0-9-]+)*\.[a-z]{2,}(?:/[^\s<>"']*)?"#)
        .unwrap()
});

/// Matches a leading field label ("Meta title:") on a line of text.
#[derive(Debug, Clone)]
pub(crate) struct LabelMatcher {
    label: String,
    colon_optional: bool,
}

impl LabelMatcher {
    pub fn new(label: &FieldLabel) -> Self {
        Self {
            label: label.label.trim().trim_end_matches(':').trim().to_string(),
            colon_optional: label.colon_optional,
        }
    }

    /// Text following the label and its colon, or `None` when the line does
    /// not start with this label. Case-insensitive.
    pub fn strip<'t>(&self, text: &'t str) -> Option<&'t str> {
        let text = text.trim_start();
        let head = text.get(..self.label.len())?;
        if !head.eq_ignore_ascii_case(&self.label) {
            return None;
        }

        let rest = &text[self.label.len()..];
        if let Some(after_colon) = rest.trim_start().strip_prefix(':') {
            return Some(after_colon.trim());
        }
        if !self.colon_optional {
            return None;
        }
        // Without a colon the label must end on a word boundary.
        match rest.chars().next() {
            None => Some(""),
            Some(c) if c.is_whitespace() => Some(rest.trim()),
            Some(_) => None,
        }
    }
}

/// Shared state for the label scans over one document.
pub(crate) struct ScanContext<'a, 'c> {
    pub body: ElementRef<'a>,
    pub classifier: &'c dyn StyleClassifier,
    pub unwrapper: &'c RedirectUnwrapper,
}

impl<'a> ScanContext<'a, '_> {
    /// The first text block after `block`'s subtree.
    pub fn next_text_block(&self, block: ElementRef<'a>) -> Option<ElementRef<'a>> {
        ElementWalker::after(block, self.body).find(|el| self.classifier.is_text_block(*el))
    }

    /// URL for a labeled line: an anchor in the label's block, else a bare
    /// token after the label, else (when the label stands alone) an anchor
    /// in the following text block. Plain text on the following line belongs
    /// to whatever that line says, so it is never read as a URL. Redirect
    /// wrappers are unwrapped.
    pub fn url_value(
        &self,
        block: ElementRef<'a>,
        remainder: &str,
        stop: Option<&PageMarker<'a>>,
    ) -> Option<String> {
        let found = first_anchor_href(block)
            .or_else(|| bare_url(remainder))
            .or_else(|| {
                if !remainder.is_empty() {
                    return None;
                }
                let next = self.next_text_block(block)?;
                if stop.is_some_and(|m| m.is(next)) || self.classifier.is_content_heading(next) {
                    return None;
                }
                first_anchor_href(next)
            })?;
        Some(self.unwrapper.unwrap(&found))
    }
}

fn bare_url(text: &str) -> Option<String> {
    BARE_URL_REGEX
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ')']).to_string())
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub(crate) struct PageLabels {
    pub page_url: LabelMatcher,
    pub meta_title: LabelMatcher,
    pub meta_description: LabelMatcher,
    pub author: LabelMatcher,
}

/// Fields collected between a marker and its content heading.
#[derive(Debug, Default)]
pub(crate) struct PageFields<'a> {
    pub page_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub author: Option<String>,
    pub heading: Option<ElementRef<'a>>,
}

/// Walk forward from `marker` collecting labeled fields, first seen wins.
///
/// Stops at `next` (no heading for this page) or at the first content
/// heading whose text is not itself a marker, which becomes the heading.
pub(crate) fn scan_page<'a>(
    ctx: &ScanContext<'a, '_>,
    labels: &PageLabels,
    markers: &MarkerMatcher,
    marker: &PageMarker<'a>,
    next: Option<&PageMarker<'a>>,
) -> PageFields<'a> {
    let mut fields = PageFields::default();

    for el in ElementWalker::after(marker.element, ctx.body) {
        if next.is_some_and(|m| m.is(el)) {
            break;
        }
        if ctx.classifier.is_content_heading(el) && !markers.matches(&normalized_text(el)) {
            fields.heading = Some(el);
            break;
        }
        if !ctx.classifier.is_text_block(el) {
            continue;
        }

        let text = normalized_text(el);
        if fields.page_url.is_none() {
            if let Some(rest) = labels.page_url.strip(&text) {
                fields.page_url = ctx.url_value(el, rest, next);
                continue;
            }
        }
        if fields.meta_title.is_none() {
            if let Some(rest) = labels.meta_title.strip(&text) {
                fields.meta_title = non_empty(rest);
                continue;
            }
        }
        if fields.meta_description.is_none() {
            if let Some(rest) = labels.meta_description.strip(&text) {
                fields.meta_description = non_empty(rest);
                continue;
            }
        }
        if fields.author.is_none() {
            if let Some(rest) = labels.author.strip(&text) {
                fields.author = non_empty(rest);
            }
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_requires_colon_unless_optional() {
        let strict = LabelMatcher::new(&FieldLabel::new("Meta title", false));
        assert_eq!(strict.strip("Meta title: Hello"), Some("Hello"));
        assert_eq!(strict.strip("  META TITLE :Hello "), Some("Hello"));
        assert_eq!(strict.strip("Meta title Hello"), None);
        assert_eq!(strict.strip("The Meta title: x"), None);

        let loose = LabelMatcher::new(&FieldLabel::new("Page URL", true));
        assert_eq!(loose.strip("Page URL https://a.com"), Some("https://a.com"));
        assert_eq!(loose.strip("page url: https://a.com"), Some("https://a.com"));
        assert_eq!(loose.strip("Page URL"), Some(""));
        assert_eq!(loose.strip("Page URLs are listed below"), None);
    }

    #[test]
    fn configured_label_with_colon_is_normalized() {
        let matcher = LabelMatcher::new(&FieldLabel::new("Author:", false));
        assert_eq!(matcher.strip("Author: Jane"), Some("Jane"));
    }

    #[test]
    fn bare_url_tokens() {
        assert_eq!(bare_url("see https://a.com/x."), Some("https://a.com/x".to_string()));
        assert_eq!(bare_url("acme.com/shoes"), Some("acme.com/shoes".to_string()));
        assert_eq!(bare_url("none here"), None);
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" a "), Some("a".to_string()));
    }
}
