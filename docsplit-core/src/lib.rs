// Docsplit Core Library
//
// Splits one long copy document into per-page records.
// Main interface: raw source → markup → SegmentedDocument.

pub mod types;
pub mod error;
pub mod config;
pub mod markup;
pub mod classifier;
pub mod links;
pub mod segmenter;
pub mod preprocessors;
pub mod sources;
pub mod formatting;
pub mod cache;
pub mod storage;
pub mod serialization;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::DocsplitError;
pub use config::SegmentationConfig;
pub use classifier::{ExportStyleClassifier, StyleClassifier};
pub use links::{extract_doc_id, RedirectUnwrapper};
pub use segmenter::{segment, Segmenter};
pub use preprocessors::{GdocPreprocessor, HtmlPreprocessor, Preprocessor};
pub use sources::{DocumentSource, FileSource};
pub use processor::{DocumentProcessor, PipelineStages};

// Re-export backends for direct use
pub use storage::{DocumentStorage, FileStorage, NoOpStorage};
