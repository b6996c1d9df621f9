use super::markers::PageMarker;
use crate::markup::{
    child_count, child_index, following_text, is_within, leading_text, serialize_children_range,
    top_level_child, ElementWalker,
};
use scraper::ElementRef;

/// Markup from `heading` (inclusive) up to `next` (exclusive).
///
/// The body container's direct children are sliced by index between the
/// top-level ancestors of both boundaries, so content is neither repeated
/// nor dropped when boundaries sit in different wrappers. When a boundary
/// has no usable top-level ancestor, both share one, or the heading's
/// ancestor still holds the page's own marker, the slice falls back to
/// `walk_until`.
pub(crate) fn extract_body<'a>(
    body: ElementRef<'a>,
    marker: &PageMarker<'a>,
    heading: ElementRef<'a>,
    next: Option<&PageMarker<'a>>,
) -> String {
    let start = top_level_child(heading, body)
        .filter(|top| !is_within(marker.element, *top))
        .and_then(|top| child_index(body, top));
    let end = match next {
        Some(next) => top_level_child(next.element, body).and_then(|top| child_index(body, top)),
        None => Some(child_count(body)),
    };

    match (start, end) {
        (Some(start), Some(end)) if end > start => serialize_children_range(body, start, end),
        _ => {
            tracing::warn!(
                "⚠️  Page boundaries share no separable top-level container (start={:?}, end={:?}), walking elements instead",
                start,
                end
            );
            walk_until(body, heading, next.map(|m| m.element))
        }
    }
}

/// Forward walk from `heading`, emitting whole subtrees until `stop`.
///
/// Elements that contain `stop` are entered rather than emitted, so the
/// output ends right before it. Loose text between emitted elements is
/// kept. Best effort: wrapper tags around the collected elements are not
/// reproduced.
pub(crate) fn walk_until<'a>(
    body: ElementRef<'a>,
    heading: ElementRef<'a>,
    stop: Option<ElementRef<'a>>,
) -> String {
    let mut out = String::new();
    let mut walker = ElementWalker::starting_at(heading, body);

    while let Some(el) = walker.next() {
        if let Some(stop) = stop {
            if stop.id() == el.id() {
                break;
            }
            if is_within(stop, el) {
                out.push_str(&leading_text(el));
                continue;
            }
        }
        out.push_str(&el.html());
        out.push_str(&following_text(el, body));
        walker.skip_subtree(el);
    }

    out
}
