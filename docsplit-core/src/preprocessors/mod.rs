//! Document Preprocessors
//!
//! This module converts the supported source shapes into markup that feeds
//! the segmenter.
//!
//! ## Architecture
//!
//! ```text
//! Source document (exported HTML, native JSON)
//!     ↓
//! [Format-specific Preprocessor]
//!     ↓
//! Markup
//!     ↓
//! [Segmenter]
//!     ↓
//! SegmentedDocument
//! ```
//!
//! ## Available Preprocessors
//!
//! - `HtmlPreprocessor` - provider "export as HTML" markup
//! - `GdocPreprocessor` - provider-native JSON, rendered by `Renderer`

pub mod gdoc;
pub mod html;
pub mod traits;

// Re-export main types
pub use gdoc::{DocumentTree, GdocPreprocessor, ListStack, Renderer};
pub use html::HtmlPreprocessor;
pub use traits::Preprocessor;

use crate::config::RendererConfig;
use crate::types::SourceKind;

/// Preprocessor for a source kind.
pub fn for_kind(kind: SourceKind, renderer: &RendererConfig) -> Box<dyn Preprocessor + Send + Sync> {
    match kind {
        SourceKind::Html => Box::new(HtmlPreprocessor::new()),
        SourceKind::DocsJson => Box::new(GdocPreprocessor::new(renderer)),
    }
}
