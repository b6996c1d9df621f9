use crate::config::ClassifierConfig;
use scraper::ElementRef;

/// Style classification seam for the segmenter.
///
/// What counts as "title-level" or as a content heading depends on the
/// exporter that produced the markup, so traversal code only ever asks
/// this trait and never inspects classes or tags itself.
pub trait StyleClassifier {
    /// Element is styled as a title (candidate page marker).
    fn is_title_style(&self, element: ElementRef<'_>) -> bool;

    /// Element is the heading that opens a page's content body.
    fn is_content_heading(&self, element: ElementRef<'_>) -> bool;

    /// Element is a block whose text can carry a labeled metadata line.
    fn is_text_block(&self, element: ElementRef<'_>) -> bool;
}

/// Classifier for provider HTML exports and for our own rendered markup.
///
/// Provider exports mark Title-styled paragraphs with a `title` class token
/// next to generated `c<N>` classes; the renderer emits the same token.
pub struct ExportStyleClassifier {
    title_classes: Vec<String>,
    title_style_fragments: Vec<String>,
    content_heading_tags: Vec<String>,
    text_block_tags: Vec<String>,
}

impl Default for ExportStyleClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl ExportStyleClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let lower = |v: &[String]| v.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>();
        Self {
            title_classes: lower(&config.title_classes),
            title_style_fragments: lower(&config.title_style_fragments),
            content_heading_tags: lower(&config.content_heading_tags),
            text_block_tags: lower(&config.text_block_tags),
        }
    }

    fn is_container(name: &str) -> bool {
        matches!(name, "div" | "section" | "article" | "main")
    }
}

impl StyleClassifier for ExportStyleClassifier {
    fn is_title_style(&self, element: ElementRef<'_>) -> bool {
        let value = element.value();

        let by_class = value
            .classes()
            .any(|class| self.title_classes.iter().any(|t| class.eq_ignore_ascii_case(t)));
        if by_class {
            return true;
        }

        match value.attr("style") {
            Some(style) if !self.title_style_fragments.is_empty() => {
                let style = style.to_lowercase();
                self.title_style_fragments.iter().any(|f| style.contains(f.as_str()))
            }
            _ => false,
        }
    }

    fn is_content_heading(&self, element: ElementRef<'_>) -> bool {
        let name = element.value().name();
        self.content_heading_tags.iter().any(|t| t == name)
    }

    fn is_text_block(&self, element: ElementRef<'_>) -> bool {
        let name = element.value().name();
        if !self.text_block_tags.iter().any(|t| t == name) {
            return false;
        }
        if !Self::is_container(name) {
            return true;
        }
        // Containers only count as a line when they wrap bare text.
        !element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .any(|child| {
                let child_name = child.value().name();
                self.text_block_tags.iter().any(|t| t == child_name)
            })
    }
}
