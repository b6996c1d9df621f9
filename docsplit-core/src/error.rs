use thiserror::Error;

/// Typed failures surfaced at the edges of the pipeline.
///
/// The renderer and segmenter never produce these for content problems;
/// malformed documents degrade to `None` fields or empty page lists.
#[derive(Debug, Error)]
pub enum DocsplitError {
    #[error("source document is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    #[error("source document is not a valid structured document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("could not extract document ID from the provided URL: {0}")]
    InvalidDocumentUrl(String),

    #[error("{field} contains invalid characters: {value:?}")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("formatter not found for client '{client_id}' and content type '{content_type}'")]
    FormatterNotFound {
        client_id: String,
        content_type: String,
    },

    #[error("invalid pattern in config ({name}): {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}
