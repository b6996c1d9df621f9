// Preprocessor abstraction for source documents
//
// This module defines the boundary between source decoding (raw bytes -> markup)
// and segmentation (markup -> pages). Every source shape ends up as markup, so
// the segmenter never needs to know where a document came from.

use crate::segmenter::Segmenter;
use crate::types::SegmentedDocument;
use anyhow::Result;
use std::path::Path;

/// Preprocessor trait - converts raw source documents to markup
///
/// Processing happens in two clear steps:
/// 1. Source bytes -> markup (exported HTML passes through, native JSON is rendered)
/// 2. Markup -> SegmentedDocument (shared segmenter, format-agnostic)
pub trait Preprocessor {
    /// Step 1: Convert raw source bytes to markup
    fn to_markup(&self, raw: &[u8]) -> Result<String>;

    /// Full processing: markup conversion followed by segmentation
    fn process(&self, raw: &[u8], segmenter: &Segmenter) -> Result<SegmentedDocument> {
        let markup = self.to_markup(raw)?;
        Ok(segmenter.segment(&markup))
    }

    /// Reads the file and processes its bytes
    fn process_file(&self, input: &Path, segmenter: &Segmenter) -> Result<SegmentedDocument> {
        let raw = std::fs::read(input)?;
        self.process(&raw, segmenter)
    }

    /// Preprocessor name for logging
    fn name(&self) -> &str;

    fn supports_file_type(&self, path: &Path) -> bool;
}

/// Decode source bytes as UTF-8, dropping a leading byte-order mark.
pub(crate) fn decode_utf8(raw: &[u8]) -> Result<&str, crate::error::DocsplitError> {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    Ok(std::str::from_utf8(raw)?)
}

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}
