use super::traits::{decode_utf8, has_extension, Preprocessor};
use anyhow::Result;
use std::path::Path;

/// Provider "export as HTML" documents. The markup is used as-is.
#[derive(Debug, Default, Clone)]
pub struct HtmlPreprocessor;

impl HtmlPreprocessor {
    pub fn new() -> Self {
        Self
    }
}

impl Preprocessor for HtmlPreprocessor {
    fn to_markup(&self, raw: &[u8]) -> Result<String> {
        let markup = decode_utf8(raw)?;
        tracing::debug!("HTML source: {} bytes of markup", markup.len());
        Ok(markup.to_string())
    }

    fn name(&self) -> &str {
        "html-export"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        has_extension(path, &["html", "htm", "xhtml"])
    }
}
