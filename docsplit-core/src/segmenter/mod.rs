//! Page segmentation: finds "Page N" markers in a markup tree and slices
//! each page's metadata and body out of it.
//!
//! The scan runs in four steps over one parsed tree:
//! 1. global labeled lines (client name, client URL, number of pages),
//! 2. marker discovery,
//! 3. per-page labeled lines up to the page's content heading,
//! 4. body slicing between the content heading and the next marker,
//!
//! followed by assembly and truncation to the declared page count.
//! Content problems never fail the scan; they yield `None` fields or
//! empty bodies.

mod body;
mod fields;
mod globals;
mod markers;

pub use markers::PageMarker;

use crate::classifier::{ExportStyleClassifier, StyleClassifier};
use crate::config::SegmentationConfig;
use crate::error::DocsplitError;
use crate::links::RedirectUnwrapper;
use crate::markup::{normalized_text, MarkupTree};
use crate::types::{PageRecord, SegmentedDocument};
use fields::{LabelMatcher, PageLabels, ScanContext};
use globals::GlobalLabels;
use markers::{MarkerMatcher, DEFAULT_MARKER_REGEX};
use regex::Regex;

pub struct Segmenter {
    classifier: Box<dyn StyleClassifier + Send + Sync>,
    markers: MarkerMatcher,
    global_labels: GlobalLabels,
    page_labels: PageLabels,
    unwrapper: RedirectUnwrapper,
    allow_unstyled_fallback: bool,
    truncate_to_page_count: bool,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::build(&SegmentationConfig::default(), DEFAULT_MARKER_REGEX.clone())
    }
}

impl Segmenter {
    /// Build a segmenter from config. Fails only on an invalid marker pattern.
    pub fn new(config: &SegmentationConfig) -> Result<Self, DocsplitError> {
        let pattern = match &config.markers.pattern {
            Some(pattern) => Regex::new(pattern).map_err(|source| DocsplitError::InvalidPattern {
                name: "markers.pattern".to_string(),
                source,
            })?,
            None => DEFAULT_MARKER_REGEX.clone(),
        };
        Ok(Self::build(config, pattern))
    }

    fn build(config: &SegmentationConfig, pattern: Regex) -> Self {
        let labels = &config.labels;
        Self {
            classifier: Box::new(ExportStyleClassifier::new(&config.classifier)),
            markers: MarkerMatcher::new(pattern),
            global_labels: GlobalLabels {
                client_name: LabelMatcher::new(&labels.client_name),
                client_url: LabelMatcher::new(&labels.client_url),
                number_of_pages: LabelMatcher::new(&labels.number_of_pages),
            },
            page_labels: PageLabels {
                page_url: LabelMatcher::new(&labels.page_url),
                meta_title: LabelMatcher::new(&labels.meta_title),
                meta_description: LabelMatcher::new(&labels.meta_description),
                author: LabelMatcher::new(&labels.author),
            },
            unwrapper: RedirectUnwrapper::new(&config.links),
            allow_unstyled_fallback: config.markers.allow_unstyled_fallback,
            truncate_to_page_count: config.truncate_to_page_count,
        }
    }

    /// Replace the style classifier used for markers, headings and text blocks.
    pub fn with_classifier(mut self, classifier: Box<dyn StyleClassifier + Send + Sync>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn segment(&self, markup: &str) -> SegmentedDocument {
        let tree = MarkupTree::parse(markup);
        self.segment_tree(&tree)
    }

    pub fn segment_tree(&self, tree: &MarkupTree) -> SegmentedDocument {
        let body = tree.body();
        let ctx = ScanContext {
            body,
            classifier: self.classifier.as_ref(),
            unwrapper: &self.unwrapper,
        };

        let globals = globals::scan_globals(&ctx, &self.global_labels);
        let markers = self
            .markers
            .find(body, self.classifier.as_ref(), self.allow_unstyled_fallback);

        tracing::info!(
            "🔍 Found {} page markers (client: {:?}, declared pages: {:?})",
            markers.len(),
            globals.client_name,
            globals.number_of_pages
        );

        let mut pages = Vec::with_capacity(markers.len());
        for (position, marker) in markers.iter().enumerate() {
            let next = markers.get(position + 1);
            let fields = fields::scan_page(&ctx, &self.page_labels, &self.markers, marker, next);

            let page_number = marker.number.unwrap_or(position as u32 + 1);
            let mut page = PageRecord::new(page_number, marker.text.clone());
            page.page_url = fields.page_url;
            page.meta_title = fields.meta_title;
            page.meta_description = fields.meta_description;
            page.author = fields.author;

            match fields.heading {
                Some(heading) => {
                    let text = normalized_text(heading);
                    page.page_heading = (!text.is_empty()).then_some(text);
                    page.page_body = body::extract_body(body, marker, heading, next);
                }
                None => {
                    tracing::debug!("Page {} has no content heading before the next marker", page_number);
                }
            }

            tracing::debug!(
                "   📄 Page {}: heading={:?}, body={} bytes",
                page.page_number,
                page.page_heading,
                page.page_body.len()
            );
            pages.push(page);
        }

        if self.truncate_to_page_count {
            truncate_to_declared(&mut pages, globals.number_of_pages);
        }

        SegmentedDocument { globals, pages }
    }
}

/// Drop trailing pages beyond a positive declared count.
fn truncate_to_declared(pages: &mut Vec<PageRecord>, declared: Option<u32>) {
    let Some(declared) = declared.filter(|n| *n > 0) else {
        return;
    };
    let declared = declared as usize;
    if declared < pages.len() {
        tracing::info!(
            "✂️  Truncating {} pages to the declared {}",
            pages.len(),
            declared
        );
        pages.truncate(declared);
    }
}

/// Segment markup with the default configuration.
pub fn segment(markup: &str) -> SegmentedDocument {
    Segmenter::default().segment(markup)
}
