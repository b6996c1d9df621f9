use crate::classifier::StyleClassifier;
use crate::markup::{element_text, ElementWalker};
use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

pub(crate) static DEFAULT_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*page\s+(\d+)\s*$").unwrap());

/// A located page boundary.
#[derive(Debug, Clone)]
pub struct PageMarker<'a> {
    pub element: ElementRef<'a>,
    /// Trimmed marker text, e.g. `Page 3`
    pub text: String,
    /// Number parsed from the text; `None` when it does not fit a u32
    pub number: Option<u32>,
    /// Whether the element carried a title-level style
    pub styled: bool,
}

impl PageMarker<'_> {
    pub fn is(&self, el: ElementRef<'_>) -> bool {
        self.element.id() == el.id()
    }
}

pub(crate) struct MarkerMatcher {
    pattern: Regex,
}

impl MarkerMatcher {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// Whether `text` reads as a marker ("Page 7").
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    fn number(&self, text: &str) -> Option<u32> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Collect markers in document order.
    ///
    /// Title-styled matches win. Only when there are none, and the fallback
    /// is enabled, any element whose whole text matches is accepted; the
    /// outermost such element is kept and its subtree is not searched again.
    pub fn find<'a>(
        &self,
        body: ElementRef<'a>,
        classifier: &dyn StyleClassifier,
        allow_unstyled_fallback: bool,
    ) -> Vec<PageMarker<'a>> {
        let styled = self.scan(body, Some(classifier));
        if !styled.is_empty() || !allow_unstyled_fallback {
            return styled;
        }

        let loose = self.scan(body, None);
        if !loose.is_empty() {
            tracing::warn!(
                "⚠️  No title-styled page markers, accepted {} unstyled matches",
                loose.len()
            );
        }
        loose
    }

    fn scan<'a>(
        &self,
        body: ElementRef<'a>,
        classifier: Option<&dyn StyleClassifier>,
    ) -> Vec<PageMarker<'a>> {
        let mut markers = Vec::new();
        let mut walker = ElementWalker::within(body);

        while let Some(el) = walker.next() {
            if let Some(classifier) = classifier {
                if !classifier.is_title_style(el) {
                    continue;
                }
            }
            let text = element_text(el);
            if !self.matches(&text) {
                continue;
            }
            markers.push(PageMarker {
                element: el,
                text: text.trim().to_string(),
                number: self.number(&text),
                styled: classifier.is_some(),
            });
            walker.skip_subtree(el);
        }

        markers
    }
}
