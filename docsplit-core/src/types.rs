use serde::{Deserialize, Serialize};
use std::path::Path;

/// The schema version stamped on every report output.
/// Bump this when the output shape changes.
pub const SCHEMA_VERSION: &str = "0.1.0";

// ===== SEGMENTER OUTPUT =====
// Field names are the hand-off contract with downstream formatters and
// must stay camelCase exactly as serialized here.

/// Document-level fields found ahead of the first page marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalMetadata {
    pub client_name: Option<String>,
    pub client_url: Option<String>,
    pub number_of_pages: Option<u32>,
}

/// One logical page of copy, sliced out of the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Number taken from the marker text, or 1-based marker position as fallback.
    /// May repeat or run out of order when markers are malformed.
    pub page_number: u32,
    pub title_marker_text: String,
    pub page_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub author: Option<String>,
    pub page_heading: Option<String>,
    /// Markup from the content heading (inclusive) to the next marker (exclusive).
    pub page_body: String,
}

impl PageRecord {
    pub fn new(page_number: u32, title_marker_text: String) -> Self {
        Self {
            page_number,
            title_marker_text,
            page_url: None,
            meta_title: None,
            meta_description: None,
            author: None,
            page_heading: None,
            page_body: String::new(),
        }
    }
}

/// Segmenter result: global metadata plus pages in marker order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedDocument {
    pub globals: GlobalMetadata,
    pub pages: Vec<PageRecord>,
}

impl SegmentedDocument {
    pub fn page(&self, page_number: u32) -> Option<&PageRecord> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }
}

// ===== SOURCE TYPES =====

/// Which shape the raw source document arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Provider "export as HTML" markup, or markup produced by our renderer.
    Html,
    /// Provider-native structured document JSON.
    DocsJson,
}

impl SourceKind {
    /// Detect from file extension, falling back to sniffing the content.
    pub fn detect(path: Option<&Path>, raw: &[u8]) -> Self {
        let by_extension = path
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match by_extension.as_deref() {
            Some("html") | Some("htm") | Some("xhtml") => SourceKind::Html,
            Some("json") => SourceKind::DocsJson,
            _ => Self::sniff(raw),
        }
    }

    fn sniff(raw: &[u8]) -> Self {
        let first = raw
            .strip_prefix(b"\xEF\xBB\xBF")
            .unwrap_or(raw)
            .iter()
            .find(|b| !b.is_ascii_whitespace());
        match first {
            Some(b'{') => SourceKind::DocsJson,
            _ => SourceKind::Html,
        }
    }
}

/// A raw document handed over by a `DocumentSource`.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub id: String,
    pub kind: SourceKind,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_record_serializes_with_contract_field_names() {
        let mut page = PageRecord::new(3, "Page 3".to_string());
        page.page_url = Some("https://example.com/a".to_string());
        let value = serde_json::to_value(&page).unwrap();

        for key in [
            "pageNumber",
            "titleMarkerText",
            "pageUrl",
            "metaTitle",
            "metaDescription",
            "author",
            "pageHeading",
            "pageBody",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["pageNumber"], 3);
        assert!(value["metaTitle"].is_null());
    }

    #[test]
    fn globals_serialize_camel_case() {
        let globals = GlobalMetadata {
            client_name: Some("Acme".to_string()),
            client_url: None,
            number_of_pages: Some(4),
        };
        let value = serde_json::to_value(&globals).unwrap();
        assert_eq!(value["clientName"], "Acme");
        assert!(value["clientUrl"].is_null());
        assert_eq!(value["numberOfPages"], 4);
    }

    #[test]
    fn source_kind_detection() {
        assert_eq!(
            SourceKind::detect(Some(Path::new("doc.HTML")), b"{"),
            SourceKind::Html
        );
        assert_eq!(
            SourceKind::detect(Some(Path::new("doc.json")), b"<p>"),
            SourceKind::DocsJson
        );
        assert_eq!(SourceKind::detect(None, b"  \n{\"body\":{}}"), SourceKind::DocsJson);
        assert_eq!(SourceKind::detect(None, b"\xEF\xBB\xBF<html>"), SourceKind::Html);
    }
}
