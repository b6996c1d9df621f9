use super::fields::{non_empty, LabelMatcher, ScanContext};
use crate::markup::{normalized_text, ElementWalker};
use crate::types::GlobalMetadata;
use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

static FIRST_INTEGER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static STANDALONE_DIGITS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*$").unwrap());

pub(crate) struct GlobalLabels {
    pub client_name: LabelMatcher,
    pub client_url: LabelMatcher,
    pub number_of_pages: LabelMatcher,
}

/// Document-level labeled lines. The whole document is searched and the
/// first occurrence of each label wins.
pub(crate) fn scan_globals(ctx: &ScanContext<'_, '_>, labels: &GlobalLabels) -> GlobalMetadata {
    let mut globals = GlobalMetadata::default();
    let mut seen_count_label = false;

    for el in ElementWalker::within(ctx.body) {
        if !ctx.classifier.is_text_block(el) {
            continue;
        }
        let text = normalized_text(el);

        if globals.client_name.is_none() {
            if let Some(rest) = labels.client_name.strip(&text) {
                globals.client_name = non_empty(rest);
                continue;
            }
        }
        if globals.client_url.is_none() {
            if let Some(rest) = labels.client_url.strip(&text) {
                globals.client_url = ctx.url_value(el, rest, None);
                continue;
            }
        }
        if !seen_count_label {
            if let Some(rest) = labels.number_of_pages.strip(&text) {
                seen_count_label = true;
                globals.number_of_pages = page_count(ctx, el, rest);
            }
        }

        if globals.client_name.is_some() && globals.client_url.is_some() && seen_count_label {
            break;
        }
    }

    globals
}

/// First integer on the label line, else a standalone number in the next
/// text block. Unparseable counts stay `None`.
fn page_count<'a>(ctx: &ScanContext<'a, '_>, block: ElementRef<'a>, rest: &str) -> Option<u32> {
    if let Some(m) = FIRST_INTEGER_REGEX.find(rest) {
        return m.as_str().parse().ok();
    }

    let next = ctx.next_text_block(block)?;
    let text = normalized_text(next);
    STANDALONE_DIGITS_REGEX
        .captures(&text)
        .and_then(|caps| caps[1].parse().ok())
}
