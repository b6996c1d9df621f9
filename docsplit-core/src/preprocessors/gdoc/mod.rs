//! Provider-native structured documents (JSON), rendered to markup.

pub mod document;
pub mod renderer;

pub use document::DocumentTree;
pub use renderer::{render_inline, ListStack, Renderer};

use super::traits::{decode_utf8, has_extension, Preprocessor};
use crate::config::RendererConfig;
use crate::error::DocsplitError;
use anyhow::Result;
use std::path::Path;

pub struct GdocPreprocessor {
    renderer: Renderer,
}

impl Default for GdocPreprocessor {
    fn default() -> Self {
        Self::new(&RendererConfig::default())
    }
}

impl GdocPreprocessor {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            renderer: Renderer::new(config),
        }
    }

    pub fn parse_document(&self, raw: &[u8]) -> Result<DocumentTree> {
        let text = decode_utf8(raw)?;
        let doc = DocumentTree::from_json(text).map_err(DocsplitError::from)?;
        Ok(doc)
    }
}

impl Preprocessor for GdocPreprocessor {
    fn to_markup(&self, raw: &[u8]) -> Result<String> {
        let doc = self.parse_document(raw)?;
        tracing::info!(
            "📝 Rendering native document {:?} ({} blocks, {} lists)",
            doc.title.as_deref().unwrap_or("untitled"),
            doc.body.content.len(),
            doc.lists.len()
        );
        Ok(self.renderer.render(&doc))
    }

    fn name(&self) -> &str {
        "gdoc-json"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::Segmenter;

    #[test]
    fn renders_then_segments() {
        let raw = br#"{"body": {"content": [
            {"paragraph": {"elements": [{"textRun": {"content": "Page 1\n"}}], "paragraphStyle": {"namedStyleType": "TITLE"}}},
            {"paragraph": {"elements": [{"textRun": {"content": "Author: Kim\n"}}], "paragraphStyle": {"namedStyleType": "NORMAL_TEXT"}}},
            {"paragraph": {"elements": [{"textRun": {"content": "Welcome\n"}}], "paragraphStyle": {"namedStyleType": "HEADING_1"}}},
            {"paragraph": {"elements": [{"textRun": {"content": "Body\n"}}], "paragraphStyle": {"namedStyleType": "NORMAL_TEXT"}}}
        ]}}"#;
        let doc = GdocPreprocessor::default()
            .process(raw, &Segmenter::default())
            .unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].author.as_deref(), Some("Kim"));
        assert_eq!(doc.pages[0].page_body, "<h1>Welcome</h1><p>Body</p>");
    }

    #[test]
    fn invalid_json_is_a_typed_error() {
        let err = GdocPreprocessor::default().to_markup(b"{not json").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DocsplitError>(),
            Some(DocsplitError::InvalidDocument(_))
        ));
    }
}
